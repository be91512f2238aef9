use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a single call crossing the broker, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub u128);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u128);

/// Where a service lives: a domain plus an instance id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub domain: String,
    pub instance: String,
}

impl Address {
    pub fn new(domain: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            instance: instance.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.instance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    NotAvailable,
    Available,
}

/// Completion status of a synchronous remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStatus {
    Success,
    OutOfMemory,
    NotAvailable,
    ConnectionFailed,
    RemoteError,
    Unknown,
    InvalidValue,
    SubscriptionRefused,
    SerializationError,
}

impl CallStatus {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallStatus::Success)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Status of a call together with its typed result, present only when
/// the call succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome<T> {
    pub status: CallStatus,
    pub result: Option<T>,
}

impl<T> CallOutcome<T> {
    pub fn success(result: T) -> Self {
        Self {
            status: CallStatus::Success,
            result: Some(result),
        }
    }

    pub fn failed(status: CallStatus) -> Self {
        Self {
            status,
            result: None,
        }
    }
}

/// Failure raised while dispatching a call to a registered object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    UnknownMethod(String),
    Serialization(String),
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::UnknownMethod(m) => write!(f, "Unknown method: {m}"),
            RpcError::Serialization(e) => write!(f, "Serialization error: {e}"),
        }
    }
}

impl std::error::Error for RpcError {}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::Serialization(err.to_string())
    }
}

impl From<&RpcError> for CallStatus {
    fn from(err: &RpcError) -> Self {
        match err {
            RpcError::UnknownMethod(_) => CallStatus::RemoteError,
            RpcError::Serialization(_) => CallStatus::SerializationError,
        }
    }
}

/// Method names of the Vehicle Media Control interface.
pub mod method {
    pub const SOURCE_CONNECT_TO: &str = "sourceConnectTo";
    pub const PLAYER_FAST_FORWARD: &str = "playerFastForward";
    pub const GENERAL_GET_ICON: &str = "generalGetIcon";
    pub const GENERAL_GET_PARAMETERS: &str = "generalGetParameters";
    pub const PLAYER_PAUSE: &str = "playerPause";
    pub const PLAYER_PLAY: &str = "playerPlay";
    pub const PLAYER_REWIND: &str = "playerRewind";
    pub const PLAYER_SEEK_TO: &str = "playerSeekTo";
    pub const GENERAL_SET_PARAMETERS: &str = "generalSetParameters";
    pub const PLAYER_SKIP_TO_PREVIOUS: &str = "playerSkipToPrevious";
    pub const PLAYER_SKIP_TO_NEXT: &str = "playerSkipToNext";
    pub const PLAYER_STOP: &str = "playerStop";
    pub const PLAYER_PLAY_FROM_MEDIA_ID: &str = "playerPlayFromMediaId";
    pub const PLAYER_SKIP_TO_MEDIA_ID: &str = "playerSkipToMediaId";
    pub const BROWSER_ACKNOWLEDGE_KEEP_ALIVE: &str = "browserAcknowledgeKeepAlive";
    pub const BROWSER_CREATE_VIEW: &str = "browserCreateView";
    pub const BROWSER_DESTROY_VIEW: &str = "browserDestroyView";
    pub const BROWSER_MOVE_WINDOW: &str = "browserMoveWindow";
    pub const BROWSER_RESIZE_WINDOW: &str = "browserResizeWindow";
    pub const BROWSER_MOVE_VIEW_TO_ITEM: &str = "browserMoveViewToItem";
}

/// Attribute-change and broadcast topics of the Vehicle Media Control
/// interface.
pub mod topic {
    pub const PLAYER_PLAYBACK_STATE: &str = "playerPlaybackState";
    pub const PLAYER_ACTIVE_MEDIA_ITEM: &str = "playerActiveMediaItem";
    pub const PLAYER_ACTIVE_MEDIA_ITEM_TIME: &str = "playerActiveMediaItemTime";
    pub const SOURCE_ACTIVE_SOURCE_PROPERTIES: &str = "sourceActiveSourceProperties";
    pub const SOURCE_LIST: &str = "sourceList";
    pub const MEDIA_RESTRICTED_MODE: &str = "mediaRestrictedMode";
    pub const GENERAL_PARAMETERS_UPDATED: &str = "generalParametersUpdated";
    pub const BROWSER_QUERY_KEEP_ALIVE: &str = "browserQueryKeepAlive";
    pub const BROWSER_WINDOW_CHANGED: &str = "browserWindowChanged";
}
