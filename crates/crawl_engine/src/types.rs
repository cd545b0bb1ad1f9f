use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Reason reported when the start request never got an answer.
pub const NETWORK_REASON: &str = "network";
/// Reason reported when the server refused the start without a readable message.
pub const UNKNOWN_REASON: &str = "unknown error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "decode error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// True when no HTTP response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, FailureKind::Timeout | FailureKind::Network)
    }
}

/// Start request refused or lost. `reason` is what the user gets to see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct StartError {
    pub kind: FailureKind,
    pub reason: String,
}

impl StartError {
    pub(crate) fn rejected(status: u16, reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::HttpStatus(status),
            reason: reason.into(),
        }
    }
}

impl From<ApiError> for StartError {
    fn from(err: ApiError) -> Self {
        let reason = if err.is_transport() {
            NETWORK_REASON.to_string()
        } else {
            err.to_string()
        };
        Self {
            kind: err.kind,
            reason,
        }
    }
}

/// A status poll that produced no usable status. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status poll failed: {0}")]
pub struct PollError(#[from] pub ApiError);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartAccepted {
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub field_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub type_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    pub is_running: bool,
    pub progress: u8,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessageBody {
    pub message: Option<String>,
    pub error: Option<String>,
}
