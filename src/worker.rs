//! Provider side of the Vehicle Media Control interface.
//!
//! A provider implements [`VehicleMediaControlStub`]. [`StubAdapter`]
//! turns it into a [`SharedObject`], the method table the
//! [`Broker`](crate::broker::Broker) dispatches incoming calls through.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::broker::Broker;
use crate::rpc::{Address, RpcError, method};
use crate::types::*;

/// Trait for an object that can be exposed through the broker.
///
/// Objects must be thread-safe (`Send + Sync`) since calls are handled on
/// broker tasks.
#[async_trait]
pub trait SharedObject: Send + Sync {
    /// Handle a call of `method` with JSON-encoded `args` and return the
    /// JSON-encoded reply.
    async fn call(&self, method: &str, args: &Value) -> Result<Value, RpcError>;
}

/// Server-side capability of the Vehicle Media Control interface. One
/// handler per method; the return value is the reply sent to the caller.
#[async_trait]
pub trait VehicleMediaControlStub: Send + Sync {
    async fn source_connect_to(&self, source_id: VmcSourceId) -> VmcConnectToSourceResult;

    async fn player_fast_forward(&self) -> VmcMediaPlayerInteractionResult;

    async fn general_get_icon(
        &self,
        icon_information: VmcIconInformation,
    ) -> (VmcIcon, VmcGetIconResult);

    async fn general_get_parameters(
        &self,
        keys: Vec<String>,
    ) -> (Vec<VmcKeyValuePair>, VmcGetParametersResult);

    async fn player_pause(&self) -> VmcMediaPlayerInteractionResult;

    async fn player_play(&self) -> VmcMediaPlayerInteractionResult;

    async fn player_rewind(&self) -> VmcMediaPlayerInteractionResult;

    async fn player_seek_to(&self, new_elapsed_time: VmcTimeInMs) -> VmcMediaPlayerInteractionResult;

    async fn general_set_parameters(
        &self,
        input_parameters: Vec<VmcKeyValuePair>,
    ) -> (Vec<VmcKeyValuePair>, VmcSetParametersResult);

    async fn player_skip_to_previous(&self) -> VmcMediaPlayerInteractionResult;

    async fn player_skip_to_next(&self) -> VmcMediaPlayerInteractionResult;

    async fn player_stop(&self) -> VmcMediaPlayerInteractionResult;

    async fn player_play_from_media_id(&self, media_id: VmcMediaId) -> VmcPlayFromMediaIdResult;

    async fn player_skip_to_media_id(&self, media_id: VmcMediaId) -> VmcSkipToMediaIdResult;

    async fn browser_acknowledge_keep_alive(
        &self,
        view_id: VmcViewId,
    ) -> VmcAcknowledgeKeepAliveResult;

    async fn browser_create_view(
        &self,
        source_id: VmcSourceId,
        window_size: VmcWindowSize,
        selected_media_item: VmcSelectedMediaItem,
    ) -> (VmcViewId, VmcCreateViewResult);

    async fn browser_destroy_view(&self, view_id: VmcViewId) -> VmcDestroyViewResult;

    async fn browser_move_view_to_item(
        &self,
        view_id: VmcViewId,
        media_id: VmcMediaId,
        selected_media_item: VmcSelectedMediaItem,
    ) -> VmcMoveViewToItemResult;

    async fn browser_resize_window(
        &self,
        view_id: VmcViewId,
        new_window_size: VmcWindowSize,
    ) -> VmcResizeWindowResult;

    async fn browser_move_window(
        &self,
        view_id: VmcViewId,
        selected_media_item: VmcSelectedMediaItem,
    ) -> VmcMoveWindowResult;
}

fn decode<T: DeserializeOwned>(args: &Value) -> Result<T, RpcError> {
    Ok(T::deserialize(args)?)
}

fn encode<T: Serialize>(reply: T) -> Result<Value, RpcError> {
    Ok(serde_json::to_value(reply)?)
}

/// Routes broker calls to the typed handlers of a stub.
///
/// Arguments arrive as a JSON array holding the method's in-parameters in
/// declaration order; replies go back the same way.
pub struct StubAdapter<S> {
    stub: Arc<S>,
}

impl<S> StubAdapter<S>
where
    S: VehicleMediaControlStub + 'static,
{
    pub fn new(stub: Arc<S>) -> Self {
        Self { stub }
    }
}

#[async_trait]
impl<S> SharedObject for StubAdapter<S>
where
    S: VehicleMediaControlStub + 'static,
{
    async fn call(&self, name: &str, args: &Value) -> Result<Value, RpcError> {
        let stub = &self.stub;
        match name {
            method::SOURCE_CONNECT_TO => {
                let (source_id,) = decode(args)?;
                encode(stub.source_connect_to(source_id).await)
            }
            method::PLAYER_FAST_FORWARD => encode(stub.player_fast_forward().await),
            method::GENERAL_GET_ICON => {
                let (icon_information,) = decode(args)?;
                encode(stub.general_get_icon(icon_information).await)
            }
            method::GENERAL_GET_PARAMETERS => {
                let (keys,) = decode(args)?;
                encode(stub.general_get_parameters(keys).await)
            }
            method::PLAYER_PAUSE => encode(stub.player_pause().await),
            method::PLAYER_PLAY => encode(stub.player_play().await),
            method::PLAYER_REWIND => encode(stub.player_rewind().await),
            method::PLAYER_SEEK_TO => {
                let (new_elapsed_time,) = decode(args)?;
                encode(stub.player_seek_to(new_elapsed_time).await)
            }
            method::GENERAL_SET_PARAMETERS => {
                let (input_parameters,) = decode(args)?;
                encode(stub.general_set_parameters(input_parameters).await)
            }
            method::PLAYER_SKIP_TO_PREVIOUS => encode(stub.player_skip_to_previous().await),
            method::PLAYER_SKIP_TO_NEXT => encode(stub.player_skip_to_next().await),
            method::PLAYER_STOP => encode(stub.player_stop().await),
            method::PLAYER_PLAY_FROM_MEDIA_ID => {
                let (media_id,) = decode(args)?;
                encode(stub.player_play_from_media_id(media_id).await)
            }
            method::PLAYER_SKIP_TO_MEDIA_ID => {
                let (media_id,) = decode(args)?;
                encode(stub.player_skip_to_media_id(media_id).await)
            }
            method::BROWSER_ACKNOWLEDGE_KEEP_ALIVE => {
                let (view_id,) = decode(args)?;
                encode(stub.browser_acknowledge_keep_alive(view_id).await)
            }
            method::BROWSER_CREATE_VIEW => {
                let (source_id, window_size, selected_media_item) = decode(args)?;
                encode(
                    stub.browser_create_view(source_id, window_size, selected_media_item)
                        .await,
                )
            }
            method::BROWSER_DESTROY_VIEW => {
                let (view_id,) = decode(args)?;
                encode(stub.browser_destroy_view(view_id).await)
            }
            method::BROWSER_MOVE_VIEW_TO_ITEM => {
                let (view_id, media_id, selected_media_item) = decode(args)?;
                encode(
                    stub.browser_move_view_to_item(view_id, media_id, selected_media_item)
                        .await,
                )
            }
            method::BROWSER_RESIZE_WINDOW => {
                let (view_id, new_window_size) = decode(args)?;
                encode(stub.browser_resize_window(view_id, new_window_size).await)
            }
            method::BROWSER_MOVE_WINDOW => {
                let (view_id, selected_media_item) = decode(args)?;
                encode(stub.browser_move_window(view_id, selected_media_item).await)
            }
            _ => Err(RpcError::UnknownMethod(name.to_string())),
        }
    }
}

/// Publishes attribute changes and broadcasts of one service instance.
#[derive(Clone)]
pub struct StubPublisher {
    broker: Broker,
    address: Address,
}

impl StubPublisher {
    pub fn new(broker: Broker, address: Address) -> Self {
        Self { broker, address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    /// Serialize `value` and fan it out on `topic`. Returns the number of
    /// subscribers reached.
    pub fn fire<T: Serialize>(&self, topic: &str, value: &T) -> usize {
        match serde_json::to_value(value) {
            Ok(value) => self.broker.publish(&self.address, topic, value),
            Err(e) => {
                log::error!("Failed to serialize event for {topic}: {e}");
                0
            }
        }
    }
}
