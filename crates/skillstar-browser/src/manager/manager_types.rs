//! Browser manager error types.

use thiserror::Error;

use crate::cdp::CdpError;

/// Failures bringing up or tearing down the browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No Chrome/Chromium binary in any known location.
    #[error("No Chrome or Chromium installation found")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    /// A page was requested before `connect` succeeded.
    #[error("Browser not connected")]
    NotConnected,

    #[error(transparent)]
    Cdp(CdpError),
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::SessionClosed => BrowserError::NotConnected,
            other => BrowserError::Cdp(other),
        }
    }
}
