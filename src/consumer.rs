//! Consumer role: drives the proxy and logs what comes back.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::broker::Broker;
use crate::client::VehicleMediaControlProxy;
use crate::command::TestCase;
use crate::config;
use crate::rpc::{AvailabilityStatus, CallOutcome, CallStatus, topic};
use crate::samples;
use crate::types::*;

fn report<T: fmt::Display>(case: &TestCase, status: CallStatus, result: Option<&T>) {
    let result = result.map_or_else(|| "<none>".to_string(), |r| r.to_string());
    if !status.is_success() {
        log::warn!("ProviderTestCase [{case}] call did not complete");
    }
    log::info!(
        "ProviderTestCase [{case}] CallStatus =================> : {}(0 is SUCCESS), return result : {result}",
        status.code()
    );
}

/// Append `data` to the file at `path`, creating it if needed.
pub fn dump_to_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(data)
}

pub struct VmcConsumer {
    proxy: Option<VehicleMediaControlProxy>,
    icon_dump_path: PathBuf,
}

impl VmcConsumer {
    /// Build the proxy for the consumer instance and start listening for
    /// its availability. A proxy that cannot be built leaves the consumer
    /// without one; every call then logs and does nothing.
    pub fn new(broker: &Broker) -> Self {
        let proxy = match VehicleMediaControlProxy::build(
            broker,
            config::DOMAIN,
            config::CONSUMER_INSTANCE,
        ) {
            Ok(proxy) => Some(proxy),
            Err(e) => {
                log::error!("buildProxy failed: {e}");
                None
            }
        };

        if let Some(proxy) = &proxy {
            if let Err(e) = watch_availability(proxy) {
                log::error!("Failed to subscribe to proxy status: {e}");
            }
        }

        Self {
            proxy,
            icon_dump_path: config::icon_dump_path(),
        }
    }

    pub fn without_proxy() -> Self {
        Self {
            proxy: None,
            icon_dump_path: config::icon_dump_path(),
        }
    }

    pub fn with_icon_dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.icon_dump_path = path.into();
        self
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy.is_some()
    }

    fn proxy(&self) -> Option<&VehicleMediaControlProxy> {
        if self.proxy.is_none() {
            log::error!("VehicleMediaControlProxy is null");
        }
        self.proxy.as_ref()
    }

    fn call<T: fmt::Display>(
        &self,
        case: &TestCase,
        f: impl FnOnce(&VehicleMediaControlProxy) -> CallOutcome<T>,
    ) -> Option<CallOutcome<T>> {
        let outcome = f(self.proxy()?);
        report(case, outcome.status, outcome.result.as_ref());
        Some(outcome)
    }

    pub fn is_available(&self) -> bool {
        let available = self.proxy().is_some_and(|proxy| proxy.is_available());
        log::info!("VmcConsumer::isAvailable returned {available}");
        available
    }

    pub fn source_connect_to(
        &self,
        source_id: &str,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcConnectToSourceResult>> {
        log::info!("ProviderTestCase [{case}] Attempting to connect to source: {source_id}");
        self.call(case, |proxy| proxy.source_connect_to(source_id))
    }

    pub fn player_fast_forward(
        &self,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcMediaPlayerInteractionResult>> {
        self.call(case, |proxy| proxy.player_fast_forward())
    }

    /// Fetch an icon and append its raw bytes to the icon dump file.
    pub fn general_get_icon(
        &self,
        case: &TestCase,
    ) -> Option<CallOutcome<(VmcIcon, VmcGetIconResult)>> {
        let outcome = self
            .proxy()?
            .general_get_icon(&VmcIconInformation::default());
        report(
            case,
            outcome.status,
            outcome.result.as_ref().map(|(_, result)| result),
        );

        let icon = outcome
            .result
            .as_ref()
            .map(|(icon, _)| icon.clone())
            .unwrap_or_default();
        let data = &icon.icon_raw_data;
        if !data.is_empty() {
            if let Err(e) = dump_to_file(&self.icon_dump_path, data) {
                log::error!(
                    "Failed to dump icon to {}: {e}",
                    self.icon_dump_path.display()
                );
            }
        }

        let resolution = icon.icon_information.icon_resolution;
        log::info!(
            "iconData size {} and information width {} and height {}",
            data.len(),
            resolution.width,
            resolution.height
        );
        Some(outcome)
    }

    pub fn general_get_parameters(
        &self,
        case: &TestCase,
    ) -> Option<CallOutcome<(Vec<VmcKeyValuePair>, VmcGetParametersResult)>> {
        let keys = ["key_001".to_string(), "key_002".to_string()];
        let outcome = self.proxy()?.general_get_parameters(&keys);
        report(
            case,
            outcome.status,
            outcome.result.as_ref().map(|(_, result)| result),
        );

        if let Some((pairs, _)) = &outcome.result {
            if !pairs.is_empty() {
                log::info!(" generalGetParameters valuePair ::");
                for pair in pairs {
                    log::info!("key  value   {}    :     {}  ", pair.key, pair.value);
                }
            }
        }
        Some(outcome)
    }

    pub fn player_pause(
        &self,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcMediaPlayerInteractionResult>> {
        self.call(case, |proxy| proxy.player_pause())
    }

    pub fn player_play(
        &self,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcMediaPlayerInteractionResult>> {
        self.call(case, |proxy| proxy.player_play())
    }

    pub fn player_rewind(
        &self,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcMediaPlayerInteractionResult>> {
        self.call(case, |proxy| proxy.player_rewind())
    }

    pub fn player_seek_to(
        &self,
        new_elapsed_time: VmcTimeInMs,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcMediaPlayerInteractionResult>> {
        self.call(case, |proxy| proxy.player_seek_to(new_elapsed_time))
    }

    /// Send the sample tag list selected by `index`.
    pub fn general_set_parameters(
        &self,
        index: u32,
        case: &TestCase,
    ) -> Option<CallOutcome<(Vec<VmcKeyValuePair>, VmcSetParametersResult)>> {
        let input = samples::build_pair_vector_with_index(index);
        let outcome = self.proxy()?.general_set_parameters(&input);
        report(
            case,
            outcome.status,
            outcome.result.as_ref().map(|(_, result)| result),
        );
        Some(outcome)
    }

    pub fn player_skip_to_previous(
        &self,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcMediaPlayerInteractionResult>> {
        self.call(case, |proxy| proxy.player_skip_to_previous())
    }

    pub fn player_skip_to_next(
        &self,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcMediaPlayerInteractionResult>> {
        self.call(case, |proxy| proxy.player_skip_to_next())
    }

    pub fn player_stop(
        &self,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcMediaPlayerInteractionResult>> {
        self.call(case, |proxy| proxy.player_stop())
    }

    pub fn player_play_from_media_id(
        &self,
        media_id: &str,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcPlayFromMediaIdResult>> {
        self.call(case, |proxy| proxy.player_play_from_media_id(media_id))
    }

    pub fn player_skip_to_media_id(
        &self,
        media_id: &str,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcSkipToMediaIdResult>> {
        self.call(case, |proxy| proxy.player_skip_to_media_id(media_id))
    }

    pub fn browser_acknowledge_keep_alive(
        &self,
        view_id: VmcViewId,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcAcknowledgeKeepAliveResult>> {
        log::info!("input viewId {view_id}");
        self.call(case, |proxy| proxy.browser_acknowledge_keep_alive(view_id))
    }

    pub fn browser_create_view(
        &self,
        source_id: &str,
        window_size: VmcWindowSize,
        selected_media_item: &VmcSelectedMediaItem,
        case: &TestCase,
    ) -> Option<CallOutcome<(VmcViewId, VmcCreateViewResult)>> {
        let outcome = self.proxy()?.browser_create_view(
            source_id,
            window_size,
            selected_media_item,
        );
        report(
            case,
            outcome.status,
            outcome.result.as_ref().map(|(_, result)| result),
        );
        if let Some((view_id, _)) = &outcome.result {
            log::info!("browserCreateView got viewId {view_id}");
        }
        Some(outcome)
    }

    pub fn browser_destroy_view(
        &self,
        view_id: VmcViewId,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcDestroyViewResult>> {
        self.call(case, |proxy| proxy.browser_destroy_view(view_id))
    }

    pub fn browser_move_window(
        &self,
        view_id: VmcViewId,
        selected_media_item: &VmcSelectedMediaItem,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcMoveWindowResult>> {
        log::info!("input viewId {view_id}");
        self.call(case, |proxy| {
            proxy.browser_move_window(view_id, selected_media_item)
        })
    }

    pub fn browser_resize_window(
        &self,
        view_id: VmcViewId,
        new_window_size: VmcWindowSize,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcResizeWindowResult>> {
        self.call(case, |proxy| {
            proxy.browser_resize_window(view_id, new_window_size)
        })
    }

    pub fn browser_move_view_to_item(
        &self,
        view_id: VmcViewId,
        media_id: &str,
        selected_media_item: &VmcSelectedMediaItem,
        case: &TestCase,
    ) -> Option<CallOutcome<VmcMoveViewToItemResult>> {
        self.call(case, |proxy| {
            proxy.browser_move_view_to_item(view_id, media_id, selected_media_item)
        })
    }
}

/// Subscribe to every event of the interface the first time the service
/// shows up.
fn watch_availability(proxy: &VehicleMediaControlProxy) -> io::Result<()> {
    let subscribed = Arc::new(AtomicBool::new(false));
    let events_proxy = proxy.clone();
    proxy.subscribe_status(move |status| match status {
        AvailabilityStatus::Available => {
            log::info!("ProviderTestCase {} is available", events_proxy.address());
            if !subscribed.swap(true, Ordering::SeqCst) {
                if let Err(e) = subscribe_events(&events_proxy) {
                    log::error!("Failed to subscribe to events: {e}");
                }
            }
        }
        AvailabilityStatus::NotAvailable => log::error!("Proxy not available"),
    })
}

fn subscribe_events(proxy: &VehicleMediaControlProxy) -> io::Result<()> {
    proxy.subscribe(topic::BROWSER_QUERY_KEEP_ALIVE, |view_id: VmcViewId| {
        log::info!("ProviderTestCase recv broadcastBrowserQueryKeepAlive change({view_id})");
    })?;

    proxy.subscribe(topic::PLAYER_ACTIVE_MEDIA_ITEM_TIME, |time: VmcMediaItemTime| {
        log::info!(
            "ProviderTestCase recv ActiveMediaItemTime change: elapsed {} in total {}",
            time.elapsed_time,
            time.total_time
        );
    })?;

    proxy.subscribe(topic::PLAYER_ACTIVE_MEDIA_ITEM, log_active_media_item)?;
    proxy.subscribe(topic::SOURCE_LIST, log_source_list)?;

    proxy.subscribe(topic::PLAYER_PLAYBACK_STATE, |state: VmcPlaybackState| {
        log::info!("ProviderTestCase recv PlaybackState change: new PlaybackState: @ {state}");
    })?;

    proxy.subscribe(topic::MEDIA_RESTRICTED_MODE, |mode: VmcMediaRestrictedMode| {
        log::info!(
            "ProviderTestCase recv mediaRestrictedMode change: new RestrictedMode: {}",
            mode.value()
        );
        match mode {
            VmcMediaRestrictedMode::Unrestricted => log::info!("Media is in unrestricted mode."),
            VmcMediaRestrictedMode::Restricted => log::info!("Media is in restricted mode."),
        }
    })?;

    proxy.subscribe(
        topic::SOURCE_ACTIVE_SOURCE_PROPERTIES,
        log_active_source_properties,
    )?;

    proxy.subscribe(
        topic::GENERAL_PARAMETERS_UPDATED,
        |parameters: Vec<VmcKeyValuePair>| {
            log::debug!("ProviderTestCase recv broadcastGeneralParametersUpdated:{{");
            for pair in &parameters {
                log::debug!("key({}),val:({})", pair.key, pair.value);
            }
            log::debug!("}} broadcastGeneralParametersUpdated");
        },
    )?;

    proxy.subscribe(topic::BROWSER_WINDOW_CHANGED, log_window_changed)?;
    Ok(())
}

fn log_active_media_item(item: VmcMediaItemMetadata) {
    log::info!("ProviderTestCase recv ActiveMediaItem change");
    log::info!(" vmcMediaItemMetadata  isValid   :  {}", item.is_valid);
    log::info!(" vmcMediaItemMetadata  iconId    :  {}", item.icon_id);
    log::info!(" vmcMediaItemMetadata  displayIconId    :  {}", item.display_icon);
    log::info!(
        " vmcMediaItemMetadata  contentFormatIcons (large)    :  {}",
        item.content_format_icons.large_icon
    );
    log::info!(
        " vmcMediaItemMetadata  contentFormatIcons (small)    :  {}",
        item.content_format_icons.small_icon
    );

    let metadata = &item.metadata;
    log::info!(" mediaItem  metadata  : ");
    log::info!("  - isBrowsable: {}", metadata.is_browsable);
    log::info!("  - isPlayable : {}", metadata.is_playable);
    log::info!("  - isExplicit : {}", metadata.is_explicit);
    log::info!("  - isPublicValue: {}", metadata.is_public_value);

    log::info!(" vmcMediaItemMetadata  keyValueMap ==");
    for pair in &item.key_value_map {
        log::info!("key value  {}    :     {}  ", pair.key, pair.value);
    }
}

fn log_source_list(source_list: Vec<VmcMediaSourceItem>) {
    log::info!(
        "ProviderTestCase recv sourceList change, size: {}",
        source_list.len()
    );
    for item in &source_list {
        log::info!("  sourceItem sourceId: {}", item.source_id);
        log::info!("  sourceItem displayName: {}", item.display_name);
        log::info!("  sourceItem iconId: {}", item.icon_id);
        log::info!("  sourceItem secondaryIconId: {}", item.secondary_icon_id);
        log::info!("  sourceItem hideSource: {}", item.hide_source);
        log::info!("  sourceItem keyValueMap:");
        for pair in &item.key_value_map {
            log::info!("    key: {}, value: {}", pair.key, pair.value);
        }
    }
}

fn log_active_source_properties(properties: VmcMediaSourceProperties) {
    log::info!("ProviderTestCase recv ActiveSourceProperties change");

    let browser = &properties.source_actions.browser_actions;
    let session = &properties.source_actions.standard_session_actions;

    log::info!("Browser Actions:");
    log::info!("getBrowseRoot: {}", browser.browse_root);

    log::info!("Standard Session Actions:");
    log::info!(
        "getIsActionFastForwardSupported: {}",
        session.is_action_fast_forward_supported
    );
    log::info!("getIsActionPauseSupported: {}", session.is_action_pause_supported);
    log::info!("getIsActionPlaySupported: {}", session.is_action_play_supported);
    log::info!("getIsActionRewindSupported: {}", session.is_action_rewind_supported);
    log::info!("getIsActionSeekToSupported: {}", session.is_action_seek_to_supported);
    log::info!(
        "getIsActionSkipToNextSupported: {}",
        session.is_action_skip_to_next_supported
    );
    log::info!(
        "getIsActionSkipToPreviousSupported: {}",
        session.is_action_skip_to_previous_supported
    );
    log::info!("getIsActionStopSupported: {}", session.is_action_stop_supported);

    log::info!("Source Display Preferences:");
    log::info!(
        "showPlayPauseAsUnmuteMute: {}",
        properties
            .source_display_preferences
            .show_play_pause_as_unmute_mute
    );

    log::info!("SourceProperties valuePair ::");
    for pair in &properties.key_value_map {
        log::info!("key  value {}    :     {}  ", pair.key, pair.value);
    }
}

fn log_window_changed(result: VmcWindowChangedResult) {
    log::info!(
        "ProviderTestCase recv broadcastBrowserWindowChanged for viewID: {}",
        result.view_id
    );
    log::info!("  - viewSize: {}", result.view_size);
    log::info!(
        "  - windowChangedEvent: {}",
        result.window_changed_event.value()
    );
    log::info!("  - position: {}", result.position);
    log::info!("  - title: {}", result.title);
    log::info!("  - indexOfActiveMedia: {}", result.index_of_active_media);
    log::info!("  - mediaList size: {}", result.media_list.len());
    for item in &result.media_list {
        log::info!("    mediaItem mediaId: {}", item.media_id);
        log::info!("    mediaItem keyValueMap:");
        for pair in &item.key_value_map {
            log::info!("      key: {}, value: {}", pair.key, pair.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASE: TestCase<'static> = TestCase {
        id: 5,
        name: "playerPause",
    };

    #[test]
    fn missing_proxy_skips_every_call() {
        let consumer = VmcConsumer::without_proxy();
        assert!(!consumer.has_proxy());
        assert!(!consumer.is_available());
        assert!(consumer.player_pause(&CASE).is_none());
        assert!(consumer.general_get_icon(&CASE).is_none());
        assert!(consumer.general_set_parameters(0, &CASE).is_none());
        assert!(
            consumer
                .browser_move_window(1, &VmcSelectedMediaItem::default(), &CASE)
                .is_none()
        );
    }

    #[test]
    fn dump_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.bin");

        dump_to_file(&path, &[1, 2]).unwrap();
        dump_to_file(&path, &[3]).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_case_label() {
        assert_eq!(CASE.to_string(), "5 - playerPause");
    }
}
