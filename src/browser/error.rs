//! Browser boundary error types.

use thiserror::Error;

/// Errors raised by the CDP client and page sessions.
///
/// `ChromeNotAvailable` and `ConnectionFailed` are fatal to a run; the
/// element/timeout variants are recoverable at the row level.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Chrome not found or not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    /// Failed to establish the CDP WebSocket.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Error response from the protocol.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local I/O error (e.g. resolving the download directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error during endpoint discovery or page creation.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Navigation failed.
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// No element matched a selector.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// JavaScript evaluation raised.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// A bounded wait expired.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The session's response channel closed.
    #[error("Session closed")]
    SessionClosed,

    /// Response missing an expected field.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for BrowserError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        BrowserError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for BrowserError {
    fn from(e: reqwest::Error) -> Self {
        BrowserError::Http(e.to_string())
    }
}
