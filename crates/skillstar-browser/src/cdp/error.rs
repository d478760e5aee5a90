//! CDP error types.

use thiserror::Error;

/// Failures talking to Chrome or running commands on the page.
#[derive(Debug, Error)]
pub enum CdpError {
    /// The debug endpoint answered but the WebSocket could not be opened.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Nothing is listening on the remote debugging port.
    #[error("Chrome not reachable at {0}; is it running with --remote-debugging-port?")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Chrome rejected a command.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Endpoint discovery over `/json/version` failed.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Selector matched nothing, or matched something with no layout box.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A page-side function threw.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// The transport's receive loop has ended.
    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("invalid endpoint URL: {}", e))
    }
}
