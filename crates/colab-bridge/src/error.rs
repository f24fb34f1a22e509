//! Error types for the Colab bridge.

use thiserror::Error;

/// Main error type for the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// No successful `connect_to_colab` yet.
    #[error("Not connected to Colab. Please run 'connect_to_colab' first.")]
    NotConnected,

    /// The remote answered with a non-2xx status.
    #[error("Communication error with Colab: HTTP Error: {status} {reason}")]
    HttpStatus { status: u16, reason: String },

    /// Transport-level failures (timeout, DNS, refused, unreadable body)
    #[error("Communication error with Colab: {0}")]
    Transport(String),

    /// The remote answered with JSON that does not have the expected shape.
    #[error("Invalid response from Colab: {0}")]
    InvalidResponse(String),

    /// Configuration errors (invalid flags or environment)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// True for failures talking to the remote (bad status or transport).
    #[must_use]
    pub fn is_communication(&self) -> bool {
        matches!(self, Self::HttpStatus { .. } | Self::Transport(_))
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(describe_reqwest_error(&value))
    }
}

/// Render a reqwest error for humans.
///
/// reqwest's own `Display` is often just "error sending request"; the useful part (connection
/// refused, DNS failure, ...) lives in the source chain, so it is appended.
#[must_use]
pub fn describe_reqwest_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        return "request timed out".to_string();
    }

    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(inner) = source {
        let inner_msg = inner.to_string();
        if !msg.contains(&inner_msg) {
            msg.push_str(": ");
            msg.push_str(&inner_msg);
        }
        source = inner.source();
    }
    msg
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
