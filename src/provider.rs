//! Provider role: the stub registered under the selected instance.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::broker::Broker;
use crate::config;
use crate::rpc::{Address, topic};
use crate::types::*;
use crate::worker::{StubAdapter, StubPublisher, VehicleMediaControlStub};

/// View id every created view gets, so tests can expect it.
pub const CREATED_VIEW_ID: VmcViewId = 129;

const ICON_RAW_DATA: [u8; 2] = [0x99, 0x99];

#[derive(Default)]
struct Attributes {
    playback_state: VmcPlaybackState,
    active_media_item: VmcMediaItemMetadata,
    active_media_item_time: VmcMediaItemTime,
    active_source_properties: VmcMediaSourceProperties,
    source_list: Vec<VmcMediaSourceItem>,
    media_restricted_mode: VmcMediaRestrictedMode,
}

pub struct VmcProvider {
    publisher: StubPublisher,
    attributes: Mutex<Attributes>,
}

fn pass(test_case: &str) {
    log::info!("ConsumerTestCase-{test_case}    =================== PASS.");
}

fn log_selected_media_item(item: &VmcSelectedMediaItem) {
    log::info!("_selectedMediaItem: {item}");
}

/// Store `value` in `slot` and report whether it changed.
fn replace_if_changed<T: PartialEq + Clone>(slot: &mut T, value: &T) -> bool {
    if slot == value {
        false
    } else {
        *slot = value.clone();
        true
    }
}

impl VmcProvider {
    pub fn new(broker: Broker, instance: &str) -> Self {
        Self {
            publisher: StubPublisher::new(broker, Address::new(config::DOMAIN, instance)),
            attributes: Mutex::new(Attributes::default()),
        }
    }

    pub fn instance(&self) -> &str {
        &self.publisher.address().instance
    }

    pub fn address(&self) -> &Address {
        self.publisher.address()
    }

    fn set_attribute<T>(
        &self,
        name: &'static str,
        value: T,
        slot: impl FnOnce(&mut Attributes) -> &mut T,
    ) where
        T: PartialEq + Clone + serde::Serialize,
    {
        let changed = {
            let mut attributes = self.attributes.lock();
            replace_if_changed(slot(&mut attributes), &value)
        };
        if changed {
            let reached = self.publisher.fire(name, &value);
            log::debug!("{name} changed, notified {reached} subscriber(s)");
        } else {
            log::debug!("{name} unchanged, no event");
        }
    }

    pub fn set_player_playback_state_attribute(&self, state: VmcPlaybackState) {
        log::info!("setPlayerPlaybackStateAttribute: {state}");
        self.set_attribute(topic::PLAYER_PLAYBACK_STATE, state, |a| &mut a.playback_state);
    }

    pub fn set_player_active_media_item_attribute(&self, item: VmcMediaItemMetadata) {
        log::info!(
            "setPlayerActiveMediaItemAttribute: displayIcon {}",
            item.display_icon
        );
        self.set_attribute(topic::PLAYER_ACTIVE_MEDIA_ITEM, item, |a| {
            &mut a.active_media_item
        });
    }

    pub fn set_player_active_media_item_time_attribute(&self, time: VmcMediaItemTime) {
        log::info!(
            "setPlayerActiveMediaItemTimeAttribute: elapsed {} of {}",
            time.elapsed_time,
            time.total_time
        );
        self.set_attribute(topic::PLAYER_ACTIVE_MEDIA_ITEM_TIME, time, |a| {
            &mut a.active_media_item_time
        });
    }

    pub fn set_source_active_source_properties_attribute(
        &self,
        properties: VmcMediaSourceProperties,
    ) {
        log::info!(
            "setSourceActiveSourcePropertiesAttribute: browseRoot {}",
            properties.source_actions.browser_actions.browse_root
        );
        self.set_attribute(topic::SOURCE_ACTIVE_SOURCE_PROPERTIES, properties, |a| {
            &mut a.active_source_properties
        });
    }

    pub fn set_source_list_attribute(&self, source_list: Vec<VmcMediaSourceItem>) {
        log::info!("setSourceListAttribute: {} source(s)", source_list.len());
        self.set_attribute(topic::SOURCE_LIST, source_list, |a| &mut a.source_list);
    }

    pub fn set_media_restricted_mode_attribute(&self, mode: VmcMediaRestrictedMode) {
        log::info!("setMediaRestrictedModeAttribute: {mode}");
        self.set_attribute(topic::MEDIA_RESTRICTED_MODE, mode, |a| {
            &mut a.media_restricted_mode
        });
    }

    pub fn fire_general_parameters_updated_event(&self, parameters: Vec<VmcKeyValuePair>) {
        let reached = self
            .publisher
            .fire(topic::GENERAL_PARAMETERS_UPDATED, &parameters);
        log::info!("broadcastGeneralParametersUpdated sent to {reached} subscriber(s)");
    }

    pub fn fire_browser_query_keep_alive_event(&self, view_id: VmcViewId) {
        let reached = self.publisher.fire(topic::BROWSER_QUERY_KEEP_ALIVE, &view_id);
        log::info!("broadcastBrowserQueryKeepAlive({view_id}) sent to {reached} subscriber(s)");
    }

    pub fn fire_browser_window_changed_event(&self, result: VmcWindowChangedResult) {
        let reached = self.publisher.fire(topic::BROWSER_WINDOW_CHANGED, &result);
        log::info!(
            "broadcastBrowserWindowChanged({}) sent to {reached} subscriber(s)",
            result.window_changed_event
        );
    }

    pub fn player_playback_state(&self) -> VmcPlaybackState {
        self.attributes.lock().playback_state
    }

    pub fn media_restricted_mode(&self) -> VmcMediaRestrictedMode {
        self.attributes.lock().media_restricted_mode
    }
}

#[async_trait]
impl VehicleMediaControlStub for VmcProvider {
    async fn source_connect_to(&self, source_id: VmcSourceId) -> VmcConnectToSourceResult {
        log::trace!(
            "VmcProvider stub instance {}: sourceId {source_id}",
            self.instance()
        );
        pass("sourceConnectTo");
        VmcConnectToSourceResult::NoError
    }

    async fn player_fast_forward(&self) -> VmcMediaPlayerInteractionResult {
        pass("playerFastForward");
        VmcMediaPlayerInteractionResult::NoError
    }

    async fn general_get_icon(
        &self,
        icon_information: VmcIconInformation,
    ) -> (VmcIcon, VmcGetIconResult) {
        pass("generalGetIcon");
        let icon = VmcIcon {
            icon_raw_data: ICON_RAW_DATA.to_vec(),
            icon_information,
        };
        (icon, VmcGetIconResult::NoError)
    }

    async fn general_get_parameters(
        &self,
        keys: Vec<String>,
    ) -> (Vec<VmcKeyValuePair>, VmcGetParametersResult) {
        log::info!(
            "ConsumerTestCase-generalGetParameters    =================== PASS. with size {}",
            keys.len()
        );
        let pairs = keys
            .into_iter()
            .map(|key| VmcKeyValuePair::new(key.clone(), key))
            .collect::<Vec<_>>();
        for pair in &pairs {
            log::trace!("valuePair {}, {}", pair.key, pair.value);
        }
        (pairs, VmcGetParametersResult::NoError)
    }

    async fn player_pause(&self) -> VmcMediaPlayerInteractionResult {
        pass("playerPause");
        VmcMediaPlayerInteractionResult::NoError
    }

    async fn player_play(&self) -> VmcMediaPlayerInteractionResult {
        pass("playerPlay");
        VmcMediaPlayerInteractionResult::NoError
    }

    async fn player_rewind(&self) -> VmcMediaPlayerInteractionResult {
        pass("playerRewind");
        VmcMediaPlayerInteractionResult::NoError
    }

    async fn player_seek_to(&self, new_elapsed_time: VmcTimeInMs) -> VmcMediaPlayerInteractionResult {
        log::info!("VmcProvider newElapsedTime: {new_elapsed_time}");
        pass("playerSeekTo");
        VmcMediaPlayerInteractionResult::NoError
    }

    async fn general_set_parameters(
        &self,
        input_parameters: Vec<VmcKeyValuePair>,
    ) -> (Vec<VmcKeyValuePair>, VmcSetParametersResult) {
        pass("generalSetParameters");
        for pair in &input_parameters {
            log::trace!("value pairs {}, {}", pair.key, pair.value);
        }
        (input_parameters, VmcSetParametersResult::NoError)
    }

    async fn player_skip_to_previous(&self) -> VmcMediaPlayerInteractionResult {
        pass("playerSkipToPrevious");
        VmcMediaPlayerInteractionResult::NoError
    }

    async fn player_skip_to_next(&self) -> VmcMediaPlayerInteractionResult {
        pass("playerSkipToNext");
        VmcMediaPlayerInteractionResult::NoError
    }

    async fn player_stop(&self) -> VmcMediaPlayerInteractionResult {
        pass("playerStop");
        VmcMediaPlayerInteractionResult::NoError
    }

    async fn player_play_from_media_id(&self, media_id: VmcMediaId) -> VmcPlayFromMediaIdResult {
        log::info!("playerPlayFromMediaId called with mediaId: {media_id}");
        pass("playerPlayFromMediaId");
        VmcPlayFromMediaIdResult::NoError
    }

    async fn player_skip_to_media_id(&self, media_id: VmcMediaId) -> VmcSkipToMediaIdResult {
        log::info!("playerSkipToMediaId called with mediaId: {media_id}");
        pass("playerSkipToMediaId");
        VmcSkipToMediaIdResult::NoError
    }

    async fn browser_acknowledge_keep_alive(
        &self,
        view_id: VmcViewId,
    ) -> VmcAcknowledgeKeepAliveResult {
        log::info!("browserAcknowledgeKeepAlive called with viewId: {view_id}");
        pass("browserAcknowledgeKeepAlive");
        VmcAcknowledgeKeepAliveResult::NoError
    }

    async fn browser_create_view(
        &self,
        source_id: VmcSourceId,
        window_size: VmcWindowSize,
        selected_media_item: VmcSelectedMediaItem,
    ) -> (VmcViewId, VmcCreateViewResult) {
        pass("browserCreateView");
        log::info!("browserCreateView called with sourceId: {source_id}, windowSize: {window_size}");
        log_selected_media_item(&selected_media_item);

        let result = VmcCreateViewResult::NoError;
        log::info!(
            "browserCreateView completed with viewId: {CREATED_VIEW_ID}, result: {}",
            result.value()
        );
        (CREATED_VIEW_ID, result)
    }

    async fn browser_destroy_view(&self, view_id: VmcViewId) -> VmcDestroyViewResult {
        log::info!("browserDestroyView called with viewId: {view_id}");
        pass("browserDestroyView");
        VmcDestroyViewResult::NoError
    }

    async fn browser_move_view_to_item(
        &self,
        view_id: VmcViewId,
        media_id: VmcMediaId,
        selected_media_item: VmcSelectedMediaItem,
    ) -> VmcMoveViewToItemResult {
        log::info!("browserMoveViewToItem called with viewId: {view_id}, mediaId: {media_id}");
        log_selected_media_item(&selected_media_item);
        pass("browserMoveViewToItem");
        VmcMoveViewToItemResult::NoError
    }

    async fn browser_resize_window(
        &self,
        view_id: VmcViewId,
        new_window_size: VmcWindowSize,
    ) -> VmcResizeWindowResult {
        log::info!(
            "browserResizeWindow called with viewId: {view_id}, newWindowSize: {new_window_size}"
        );
        pass("browserResizeWindow");
        VmcResizeWindowResult::NoError
    }

    async fn browser_move_window(
        &self,
        view_id: VmcViewId,
        selected_media_item: VmcSelectedMediaItem,
    ) -> VmcMoveWindowResult {
        log::info!("browserMoveWindow called with viewId: {view_id}");
        log_selected_media_item(&selected_media_item);
        pass("browserMoveWindow");
        VmcMoveWindowResult::NoError
    }
}

/// Register `provider` with its broker and keep it registered until
/// `shutdown` turns true (or its sender goes away).
pub async fn run_stub(
    provider: Arc<VmcProvider>,
    mut shutdown: watch::Receiver<bool>,
) -> io::Result<()> {
    let address = provider.address().clone();
    log::info!(
        "VmcTestClient registerService as provider with instance ID: {}",
        address.instance
    );

    let broker = provider.publisher.broker().clone();
    if let Err(e) = broker.register_service(&address, Arc::new(StubAdapter::new(provider.clone())))
    {
        log::error!("registerService(instance:{}) error: {e}", address.instance);
        return Err(e);
    }

    if shutdown.wait_for(|exit| *exit).await.is_err() {
        log::warn!("Shutdown sender dropped, stopping provider");
    }

    broker.unregister_service(&address);
    log::info!("Exiting the provider task.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;

    use super::*;

    fn provider() -> (tokio::runtime::Runtime, Broker, VmcProvider) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let broker = Broker::with_handle(rt.handle().clone());
        let provider = VmcProvider::new(broker.clone(), config::HU_INSTANCE);
        (rt, broker, provider)
    }

    #[test]
    fn attribute_event_fires_only_on_change() {
        let (_rt, broker, provider) = provider();
        let (tx, rx) = std::sync::mpsc::channel();
        let tx = Mutex::new(tx);
        broker
            .subscribe(
                provider.address(),
                topic::PLAYER_PLAYBACK_STATE,
                Arc::new(move |value: Value| {
                    let _ = tx.lock().send(value);
                }),
            )
            .unwrap();

        provider.set_player_playback_state_attribute(VmcPlaybackState::Playing);
        provider.set_player_playback_state_attribute(VmcPlaybackState::Playing);
        provider.set_player_playback_state_attribute(VmcPlaybackState::Paused);

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first, serde_json::json!("PLAYING"));
        assert_eq!(second, serde_json::json!("PAUSED"));
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(provider.player_playback_state(), VmcPlaybackState::Paused);
    }

    #[test]
    fn broadcasts_always_publish() {
        let (_rt, broker, provider) = provider();
        let (tx, rx) = std::sync::mpsc::channel();
        let tx = Mutex::new(tx);
        broker
            .subscribe(
                provider.address(),
                topic::BROWSER_QUERY_KEEP_ALIVE,
                Arc::new(move |value: Value| {
                    let _ = tx.lock().send(value);
                }),
            )
            .unwrap();

        provider.fire_browser_query_keep_alive_event(7);
        provider.fire_browser_query_keep_alive_event(7);

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 7);
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 7);
    }

    #[tokio::test]
    async fn create_view_always_answers_129() {
        let provider = VmcProvider::new(Broker::local().unwrap(), config::HU_INSTANCE);
        let (view_id, result) = provider
            .browser_create_view("any".into(), 0, VmcSelectedMediaItem::MediaId("x".into()))
            .await;
        assert_eq!(view_id, CREATED_VIEW_ID);
        assert_eq!(result, VmcCreateViewResult::NoError);
    }

    #[tokio::test]
    async fn parameters_are_echoed() {
        let provider = VmcProvider::new(Broker::local().unwrap(), config::RSE_INSTANCE);
        let (pairs, _) = provider
            .general_get_parameters(vec!["key_001".into(), "key_002".into()])
            .await;
        assert_eq!(
            pairs,
            vec![
                VmcKeyValuePair::new("key_001", "key_001"),
                VmcKeyValuePair::new("key_002", "key_002"),
            ]
        );

        let input = crate::samples::build_pair_vector_with_index(0);
        let (echoed, result) = provider.general_set_parameters(input.clone()).await;
        assert_eq!(echoed, input);
        assert_eq!(result, VmcSetParametersResult::NoError);
    }
}
