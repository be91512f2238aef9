//! Consumer side of the Vehicle Media Control interface.

use std::io;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::broker::Broker;
use crate::rpc::{
    Address, AvailabilityStatus, CallOutcome, CallStatus, SubscriptionId, method,
};
use crate::types::*;

/// Typed handle on a Vehicle Media Control service instance.
///
/// Every method call blocks the calling thread until the provider replies
/// or the broker reports a failure.
#[derive(Clone)]
pub struct VehicleMediaControlProxy {
    broker: Broker,
    address: Address,
}

impl VehicleMediaControlProxy {
    /// Build a proxy for `instance` in `domain`. The service does not need
    /// to be registered yet.
    pub fn build(broker: &Broker, domain: &str, instance: &str) -> io::Result<Self> {
        let address = Address::new(domain, instance);
        Broker::check_domain(&address)?;
        Ok(Self {
            broker: broker.clone(),
            address,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn is_available(&self) -> bool {
        self.broker.is_registered(&self.address)
    }

    /// Report the current availability and every later change to
    /// `on_status`, on a broker task.
    pub fn subscribe_status<F>(&self, on_status: F) -> io::Result<()>
    where
        F: Fn(AvailabilityStatus) + Send + 'static,
    {
        let mut rx = self.broker.availability(&self.address)?;
        self.broker.handle().spawn(async move {
            loop {
                let status = *rx.borrow_and_update();
                on_status(status);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    /// Decode every value published on `topic` as `T` and hand it to
    /// `on_event`. Values that fail to decode are logged and dropped.
    pub fn subscribe<T, F>(&self, topic: &'static str, on_event: F) -> io::Result<SubscriptionId>
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.broker.subscribe(
            &self.address,
            topic,
            Arc::new(move |value: Value| match serde_json::from_value::<T>(value) {
                Ok(event) => on_event(event),
                Err(e) => log::warn!("Dropping undecodable {topic} event: {e}"),
            }),
        )
    }

    fn invoke<A, R>(&self, name: &str, args: A) -> CallOutcome<R>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        let args = match serde_json::to_value(args) {
            Ok(args) => args,
            Err(e) => {
                log::error!("Failed to serialize arguments of {name}: {e}");
                return CallOutcome::failed(CallStatus::SerializationError);
            }
        };

        match self.broker.call_blocking(&self.address, name, args) {
            Ok(reply) => match serde_json::from_value::<R>(reply) {
                Ok(result) => CallOutcome::success(result),
                Err(e) => {
                    log::error!("Failed to decode reply of {name}: {e}");
                    CallOutcome::failed(CallStatus::SerializationError)
                }
            },
            Err(status) => CallOutcome::failed(status),
        }
    }

    pub fn source_connect_to(&self, source_id: &str) -> CallOutcome<VmcConnectToSourceResult> {
        self.invoke(method::SOURCE_CONNECT_TO, (source_id,))
    }

    pub fn player_fast_forward(&self) -> CallOutcome<VmcMediaPlayerInteractionResult> {
        self.invoke(method::PLAYER_FAST_FORWARD, ())
    }

    pub fn general_get_icon(
        &self,
        icon_information: &VmcIconInformation,
    ) -> CallOutcome<(VmcIcon, VmcGetIconResult)> {
        self.invoke(method::GENERAL_GET_ICON, (icon_information,))
    }

    pub fn general_get_parameters(
        &self,
        keys: &[String],
    ) -> CallOutcome<(Vec<VmcKeyValuePair>, VmcGetParametersResult)> {
        self.invoke(method::GENERAL_GET_PARAMETERS, (keys,))
    }

    pub fn player_pause(&self) -> CallOutcome<VmcMediaPlayerInteractionResult> {
        self.invoke(method::PLAYER_PAUSE, ())
    }

    pub fn player_play(&self) -> CallOutcome<VmcMediaPlayerInteractionResult> {
        self.invoke(method::PLAYER_PLAY, ())
    }

    pub fn player_rewind(&self) -> CallOutcome<VmcMediaPlayerInteractionResult> {
        self.invoke(method::PLAYER_REWIND, ())
    }

    pub fn player_seek_to(
        &self,
        new_elapsed_time: VmcTimeInMs,
    ) -> CallOutcome<VmcMediaPlayerInteractionResult> {
        self.invoke(method::PLAYER_SEEK_TO, (new_elapsed_time,))
    }

    pub fn general_set_parameters(
        &self,
        input_parameters: &[VmcKeyValuePair],
    ) -> CallOutcome<(Vec<VmcKeyValuePair>, VmcSetParametersResult)> {
        self.invoke(method::GENERAL_SET_PARAMETERS, (input_parameters,))
    }

    pub fn player_skip_to_previous(&self) -> CallOutcome<VmcMediaPlayerInteractionResult> {
        self.invoke(method::PLAYER_SKIP_TO_PREVIOUS, ())
    }

    pub fn player_skip_to_next(&self) -> CallOutcome<VmcMediaPlayerInteractionResult> {
        self.invoke(method::PLAYER_SKIP_TO_NEXT, ())
    }

    pub fn player_stop(&self) -> CallOutcome<VmcMediaPlayerInteractionResult> {
        self.invoke(method::PLAYER_STOP, ())
    }

    pub fn player_play_from_media_id(
        &self,
        media_id: &str,
    ) -> CallOutcome<VmcPlayFromMediaIdResult> {
        self.invoke(method::PLAYER_PLAY_FROM_MEDIA_ID, (media_id,))
    }

    pub fn player_skip_to_media_id(&self, media_id: &str) -> CallOutcome<VmcSkipToMediaIdResult> {
        self.invoke(method::PLAYER_SKIP_TO_MEDIA_ID, (media_id,))
    }

    pub fn browser_acknowledge_keep_alive(
        &self,
        view_id: VmcViewId,
    ) -> CallOutcome<VmcAcknowledgeKeepAliveResult> {
        self.invoke(method::BROWSER_ACKNOWLEDGE_KEEP_ALIVE, (view_id,))
    }

    pub fn browser_create_view(
        &self,
        source_id: &str,
        window_size: VmcWindowSize,
        selected_media_item: &VmcSelectedMediaItem,
    ) -> CallOutcome<(VmcViewId, VmcCreateViewResult)> {
        self.invoke(
            method::BROWSER_CREATE_VIEW,
            (source_id, window_size, selected_media_item),
        )
    }

    pub fn browser_destroy_view(&self, view_id: VmcViewId) -> CallOutcome<VmcDestroyViewResult> {
        self.invoke(method::BROWSER_DESTROY_VIEW, (view_id,))
    }

    pub fn browser_move_view_to_item(
        &self,
        view_id: VmcViewId,
        media_id: &str,
        selected_media_item: &VmcSelectedMediaItem,
    ) -> CallOutcome<VmcMoveViewToItemResult> {
        self.invoke(
            method::BROWSER_MOVE_VIEW_TO_ITEM,
            (view_id, media_id, selected_media_item),
        )
    }

    pub fn browser_resize_window(
        &self,
        view_id: VmcViewId,
        new_window_size: VmcWindowSize,
    ) -> CallOutcome<VmcResizeWindowResult> {
        self.invoke(method::BROWSER_RESIZE_WINDOW, (view_id, new_window_size))
    }

    pub fn browser_move_window(
        &self,
        view_id: VmcViewId,
        selected_media_item: &VmcSelectedMediaItem,
    ) -> CallOutcome<VmcMoveWindowResult> {
        self.invoke(method::BROWSER_MOVE_WINDOW, (view_id, selected_media_item))
    }
}
