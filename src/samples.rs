//! Canned payloads the menu commands send or publish.

use crate::types::*;

const LADY_GAGA: &[(&str, &str)] = &[
    ("Format", "MPEG Audio"),
    ("File size", "6.29 MiB"),
    ("Duration", "3 min 24 s"),
    ("Overall bit rate mode", "Constant"),
    ("Overall bit rate", "256 kb/s"),
    ("Album", "The Fame"),
    ("Track name", "i Like It Rough"),
    ("Performer", "Lady Gaga"),
    ("Genre", "Electronic"),
    ("Recorded date", "2008-10-28"),
];

const BOA: &[(&str, &str)] = &[
    ("Performer", "보아"),
    ("Genre", "Ballad"),
    ("Recorded date", "2002"),
    ("Copyright", "LOEN Entertainment, Inc."),
    ("Cover", "Yes"),
    ("Cover type", "Cover (front)"),
    ("Cover MIME", "image/jpeg"),
    ("Cover MIME", "image/jpeg"),
    ("Format", "MPEG Audio"),
    ("Format version", "Version 1"),
    ("Format profile", "Layer 3"),
    ("Format settings", "Joint stereo"),
    ("Duration", "3 min 13 s"),
    ("Bit rate mode", "Constant"),
    ("Bit rate", "320 kb/s"),
    ("Channel(s)", "2 channels"),
    ("Sampling rate", "44.1 kHz"),
    ("Frame rate", "38.281 FPS (1152 SPF)"),
];

/// Tag list of a sample track: index 0 is Lady Gaga, anything else is 보아.
pub fn build_pair_vector_with_index(index: u32) -> Vec<VmcKeyValuePair> {
    let pairs = if index == 0 { LADY_GAGA } else { BOA };
    pairs
        .iter()
        .map(|(key, value)| VmcKeyValuePair::new(*key, *value))
        .collect()
}

fn two_pairs() -> Vec<VmcKeyValuePair> {
    vec![
        VmcKeyValuePair::new("key1", "value1"),
        VmcKeyValuePair::new("key2", "value2"),
    ]
}

pub fn build_media_source_properties(browse_root: &str) -> VmcMediaSourceProperties {
    VmcMediaSourceProperties {
        key_value_map: two_pairs(),
        source_id: "exampleSourceId".into(),
        source_actions: VmcSourceActions {
            browser_actions: VmcMediaBrowserActions {
                browse_root: browse_root.into(),
                contains_playlist: true,
            },
            standard_session_actions: VmcStandardSessionActions {
                is_action_fast_forward_supported: true,
                is_action_pause_supported: false,
                is_action_play_supported: true,
                is_action_rewind_supported: false,
                is_action_seek_to_supported: true,
                is_action_skip_to_next_supported: false,
                is_action_skip_to_previous_supported: true,
                is_action_stop_supported: false,
            },
        },
        source_display_preferences: VmcSourceDisplayPreferences {
            show_play_pause_as_unmute_mute: true,
        },
    }
}

pub fn build_media_item_metadata(display_icon: &str) -> VmcMediaItemMetadata {
    VmcMediaItemMetadata {
        key_value_map: two_pairs(),
        is_valid: true,
        icon_id: "iconId".into(),
        metadata: VmcMetadata {
            metadata_key_value: vec![
                VmcMetadataKeyValuePair {
                    key: VmcMetadataKey::Title,
                    value: "Example Title".into(),
                },
                VmcMetadataKeyValuePair {
                    key: VmcMetadataKey::Artist,
                    value: "Example Artist".into(),
                },
            ],
            is_browsable: true,
            is_playable: true,
            is_explicit: false,
            is_public_value: true,
        },
        content_format_icons: VmcContentFormatIcons {
            large_icon: "largeIconId".into(),
            small_icon: "smallIconId".into(),
        },
        display_icon: display_icon.into(),
    }
}

/// Two sources named after `display_name`; the second one is hidden.
pub fn build_media_source_items_by_name(display_name: &str) -> Vec<VmcMediaSourceItem> {
    vec![
        VmcMediaSourceItem {
            source_id: "008".into(),
            display_name: display_name.into(),
            icon_id: "primaryIconId1".into(),
            secondary_icon_id: "secondaryIconId1".into(),
            hide_source: false,
            key_value_map: build_pair_vector_with_index(0),
        },
        VmcMediaSourceItem {
            source_id: "009".into(),
            display_name: format!("{display_name}2"),
            icon_id: "primaryIconId2".into(),
            secondary_icon_id: "secondaryIconId2".into(),
            hide_source: true,
            key_value_map: build_pair_vector_with_index(1),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_zero_is_the_short_list() {
        let pairs = build_pair_vector_with_index(0);
        assert_eq!(pairs.len(), 10);
        assert_eq!(pairs[0], VmcKeyValuePair::new("Format", "MPEG Audio"));
        assert_eq!(pairs[9], VmcKeyValuePair::new("Recorded date", "2008-10-28"));
    }

    #[test]
    fn other_indices_share_one_list() {
        let one = build_pair_vector_with_index(1);
        assert_eq!(one, build_pair_vector_with_index(42));
        assert_eq!(one[0].value, "보아");
        // duplicate keys are kept
        assert_eq!(one.iter().filter(|p| p.key == "Cover MIME").count(), 2);
    }

    #[test]
    fn source_items_follow_display_name() {
        let items = build_media_source_items_by_name("usb");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].display_name, "usb");
        assert_eq!(items[1].display_name, "usb2");
        assert!(!items[0].hide_source);
        assert!(items[1].hide_source);
        assert_eq!(items[1].key_value_map, build_pair_vector_with_index(1));
    }

    #[test]
    fn properties_carry_browse_root() {
        let properties = build_media_source_properties("root");
        let actions = &properties.source_actions;
        assert_eq!(actions.browser_actions.browse_root, "root");
        assert!(actions.standard_session_actions.is_action_seek_to_supported);
        assert!(!actions.standard_session_actions.is_action_stop_supported);
    }
}
