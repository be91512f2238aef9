//! Data types of the Vehicle Media Control interface.
//!
//! These mirror the interface description shared by consumers and
//! providers. Every type is `serde`-serializable so it can cross the
//! [`broker`](crate::broker) as a JSON value.

use std::fmt;

use serde::{Deserialize, Serialize};

pub type VmcSourceId = String;
pub type VmcMediaId = String;
pub type VmcViewId = u8;
pub type VmcWindowSize = u16;
pub type VmcViewSize = u16;
pub type VmcTimeInMs = u32;
pub type VmcPosition = u32;

/// Declares an interface enumeration.
///
/// The first literal is the default one. Literals serialize under their
/// interface name and keep their declaration order as numeric value.
macro_rules! vmc_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $first:ident => $first_lit:literal $(, $variant:ident => $lit:literal)* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            #[serde(rename = $first_lit)]
            $first,
            $(
                #[serde(rename = $lit)]
                $variant,
            )*
        }

        impl $name {
            pub const LITERALS: &'static [$name] = &[$name::$first $(, $name::$variant)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::$first => $first_lit,
                    $($name::$variant => $lit,)*
                }
            }

            /// Literal at `index`, if the index is in range.
            pub fn from_index(index: u32) -> Option<Self> {
                Self::LITERALS.get(index as usize).copied()
            }

            /// Literal at `index` modulo the number of literals.
            pub fn from_index_wrapping(index: u32) -> Self {
                Self::LITERALS[index as usize % Self::LITERALS.len()]
            }

            pub fn value(&self) -> i32 {
                *self as i32
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vmc_enum! {
    VmcPlaybackState {
        Stopped => "STOPPED",
        Playing => "PLAYING",
        Paused => "PAUSED",
        Buffering => "BUFFERING",
    }
}

vmc_enum! {
    VmcMediaRestrictedMode {
        Unrestricted => "UNRESTRICTED",
        Restricted => "RESTRICTED",
    }
}

vmc_enum! {
    VmcWindowChangedEvent {
        ViewCreated => "VIEW_CREATED",
        WindowMoved => "WINDOW_MOVED",
        WindowResized => "WINDOW_RESIZED",
        ContentChanged => "CONTENT_CHANGED",
        ItemUpdated => "ITEM_UPDATED",
        ViewInvalidated => "VIEW_INVALIDATED",
    }
}

vmc_enum! {
    VmcMetadataKey {
        Title => "TITLE",
        Artist => "ARTIST",
        Album => "ALBUM",
        Genre => "GENRE",
        Composer => "COMPOSER",
        TrackNumber => "TRACK_NUMBER",
    }
}

vmc_enum! {
    VmcConnectToSourceResult {
        NoError => "NO_ERROR",
        InvalidSourceId => "INVALID_SOURCE_ID",
        SourceNotAvailable => "SOURCE_NOT_AVAILABLE",
    }
}

vmc_enum! {
    VmcMediaPlayerInteractionResult {
        NoError => "NO_ERROR",
        ActionNotSupported => "ACTION_NOT_SUPPORTED",
        NoActiveSource => "NO_ACTIVE_SOURCE",
    }
}

vmc_enum! {
    VmcGetIconResult {
        NoError => "NO_ERROR",
        IconNotFound => "ICON_NOT_FOUND",
    }
}

vmc_enum! {
    VmcGetParametersResult {
        NoError => "NO_ERROR",
        UnknownKey => "UNKNOWN_KEY",
    }
}

vmc_enum! {
    VmcSetParametersResult {
        NoError => "NO_ERROR",
        UnknownKey => "UNKNOWN_KEY",
        InvalidValue => "INVALID_VALUE",
    }
}

vmc_enum! {
    VmcPlayFromMediaIdResult {
        NoError => "NO_ERROR",
        InvalidMediaId => "INVALID_MEDIA_ID",
    }
}

vmc_enum! {
    VmcSkipToMediaIdResult {
        NoError => "NO_ERROR",
        InvalidMediaId => "INVALID_MEDIA_ID",
    }
}

vmc_enum! {
    VmcAcknowledgeKeepAliveResult {
        NoError => "NO_ERROR",
        InvalidViewId => "INVALID_VIEW_ID",
    }
}

vmc_enum! {
    VmcCreateViewResult {
        NoError => "NO_ERROR",
        InvalidSourceId => "INVALID_SOURCE_ID",
        TooManyViews => "TOO_MANY_VIEWS",
    }
}

vmc_enum! {
    VmcDestroyViewResult {
        NoError => "NO_ERROR",
        InvalidViewId => "INVALID_VIEW_ID",
    }
}

vmc_enum! {
    VmcMoveViewToItemResult {
        NoError => "NO_ERROR",
        InvalidViewId => "INVALID_VIEW_ID",
        InvalidMediaId => "INVALID_MEDIA_ID",
    }
}

vmc_enum! {
    VmcResizeWindowResult {
        NoError => "NO_ERROR",
        InvalidViewId => "INVALID_VIEW_ID",
        InvalidWindowSize => "INVALID_WINDOW_SIZE",
    }
}

vmc_enum! {
    VmcMoveWindowResult {
        NoError => "NO_ERROR",
        InvalidViewId => "INVALID_VIEW_ID",
        InvalidPosition => "INVALID_POSITION",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcKeyValuePair {
    pub key: String,
    pub value: String,
}

impl VmcKeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Either a position inside a view or a media id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmcSelectedMediaItem {
    Position(VmcPosition),
    MediaId(VmcMediaId),
}

impl Default for VmcSelectedMediaItem {
    fn default() -> Self {
        VmcSelectedMediaItem::Position(0)
    }
}

impl fmt::Display for VmcSelectedMediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmcSelectedMediaItem::Position(position) => write!(f, "position {position}"),
            VmcSelectedMediaItem::MediaId(media_id) => write!(f, "mediaId {media_id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcIconResolution {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcIconInformation {
    pub icon_id: String,
    pub icon_resolution: VmcIconResolution,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcIcon {
    pub icon_raw_data: Vec<u8>,
    pub icon_information: VmcIconInformation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcMediaItemTime {
    pub elapsed_time: VmcTimeInMs,
    pub total_time: VmcTimeInMs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcMetadataKeyValuePair {
    pub key: VmcMetadataKey,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcMetadata {
    pub metadata_key_value: Vec<VmcMetadataKeyValuePair>,
    pub is_browsable: bool,
    pub is_playable: bool,
    pub is_explicit: bool,
    pub is_public_value: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcContentFormatIcons {
    pub large_icon: String,
    pub small_icon: String,
}

/// Metadata describing a media item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcMediaItemMetadata {
    pub key_value_map: Vec<VmcKeyValuePair>,
    pub is_valid: bool,
    pub icon_id: String,
    pub metadata: VmcMetadata,
    pub content_format_icons: VmcContentFormatIcons,
    pub display_icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcMediaBrowserActions {
    pub browse_root: VmcMediaId,
    pub contains_playlist: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcStandardSessionActions {
    pub is_action_fast_forward_supported: bool,
    pub is_action_pause_supported: bool,
    pub is_action_play_supported: bool,
    pub is_action_rewind_supported: bool,
    pub is_action_seek_to_supported: bool,
    pub is_action_skip_to_next_supported: bool,
    pub is_action_skip_to_previous_supported: bool,
    pub is_action_stop_supported: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcSourceActions {
    pub browser_actions: VmcMediaBrowserActions,
    pub standard_session_actions: VmcStandardSessionActions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcSourceDisplayPreferences {
    pub show_play_pause_as_unmute_mute: bool,
}

/// Properties of the currently active media source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcMediaSourceProperties {
    pub key_value_map: Vec<VmcKeyValuePair>,
    pub source_id: VmcSourceId,
    pub source_actions: VmcSourceActions,
    pub source_display_preferences: VmcSourceDisplayPreferences,
}

/// Entry of the list of available media sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcMediaSourceItem {
    pub source_id: VmcSourceId,
    pub display_name: String,
    pub icon_id: String,
    pub secondary_icon_id: String,
    pub hide_source: bool,
    pub key_value_map: Vec<VmcKeyValuePair>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcMediaItem {
    pub media_id: VmcMediaId,
    pub key_value_map: Vec<VmcKeyValuePair>,
}

/// Payload of the browser window changed broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmcWindowChangedResult {
    pub view_id: VmcViewId,
    pub view_size: VmcViewSize,
    pub window_changed_event: VmcWindowChangedEvent,
    pub position: VmcPosition,
    pub title: String,
    pub index_of_active_media: VmcPosition,
    pub media_list: Vec<VmcMediaItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_index_stays_in_range() {
        assert_eq!(
            VmcPlaybackState::from_index_wrapping(5),
            VmcPlaybackState::Playing
        );
        assert_eq!(
            VmcWindowChangedEvent::from_index_wrapping(6),
            VmcWindowChangedEvent::ViewCreated
        );
        assert_eq!(VmcMediaRestrictedMode::from_index(2), None);
    }

    #[test]
    fn literals_serialize_under_interface_name() {
        let json = serde_json::to_value(VmcCreateViewResult::NoError).unwrap();
        assert_eq!(json, serde_json::json!("NO_ERROR"));
        assert_eq!(VmcPlaybackState::Paused.to_string(), "PAUSED");
        assert_eq!(VmcPlaybackState::Paused.value(), 2);
    }

    #[test]
    fn selected_item_names_its_kind() {
        assert_eq!(VmcSelectedMediaItem::Position(4).to_string(), "position 4");
        assert_eq!(
            VmcSelectedMediaItem::MediaId("15".into()).to_string(),
            "mediaId 15"
        );
    }

    #[test]
    fn default_result_is_no_error() {
        assert_eq!(
            VmcMediaPlayerInteractionResult::default(),
            VmcMediaPlayerInteractionResult::NoError
        );
    }
}
