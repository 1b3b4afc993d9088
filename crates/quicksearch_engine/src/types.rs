use std::fmt;

use quicksearch_core::{RequestId, TimerTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    Scheduled { ticket: TimerTicket },
    Posted { request_id: RequestId, endpoint: String },
    FragmentApplied { request_id: RequestId, status_updated: bool },
    FellBack { request_id: RequestId, kind: FailureKind },
    Navigated { url: String },
    NavigationFailed { url: String, kind: FailureKind },
}

/// Markup returned by a transport call, with what the server said about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOutput {
    pub markup: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub encoding_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct SubmitError {
    pub kind: FailureKind,
    pub message: String,
}

impl SubmitError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Why a request failed. The runtime treats every kind the same way; the
/// distinction only reaches logs and events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "undecodable response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
