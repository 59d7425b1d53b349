//! Client error taxonomy
//!
//! Every failure a backend call can produce collapses into [`ClientError`].
//! `Display` yields only the user-visible message, so callers can put an error
//! straight into a form or a transcript entry.

use thiserror::Error;

/// Message used when the backend gives us nothing better
pub const GENERIC_REQUEST_FAILURE: &str = "Request failed";

/// Message used when a login is rejected without a `detail`
pub const GENERIC_LOGIN_FAILURE: &str = "Login failed";

/// Errors surfaced by the session store and chat manager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Credentials rejected or identity check failed
    #[error("{0}")]
    Auth(String),

    /// Backend answered with a non-2xx status
    #[error("{message}")]
    Request { status: u16, message: String },

    /// The request never completed (offline, timeout, DNS...)
    #[error("{0}")]
    Network(String),

    /// 2xx response whose body did not match the expected shape
    #[error("{0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status, when the backend actually answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Network and request failures are shown the same way
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
            || matches!(self, Self::Request { status, .. } if *status >= 500)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network("Request timed out".to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(format!("Unexpected response from server: {}", e))
    }
}
