//! Navigation operations for CDP page session.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;

use super::core::PageSession;

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    /// `document.readyState` is at least `interactive`.
    DomContentLoaded,
    /// `document.readyState` is `complete`.
    #[default]
    Load,
    /// `complete`, then a quiet period for client-side rendering.
    NetworkIdle,
}

impl WaitUntil {
    /// Whether the given `document.readyState` satisfies this policy.
    pub fn is_satisfied_by(self, ready_state: &str) -> bool {
        match self {
            WaitUntil::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            WaitUntil::Load | WaitUntil::NetworkIdle => ready_state == "complete",
        }
    }
}

const NETWORK_IDLE_QUIET: Duration = Duration::from_millis(500);

impl PageSession {
    /// Navigate to URL and wait according to `wait`.
    pub async fn navigate(&self, url: &str, wait: WaitUntil) -> Result<String, CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText") {
            return Err(CdpError::NavigationFailed(format!(
                "{}: {}",
                url,
                error.as_str().unwrap_or("Unknown error")
            )));
        }

        let frame_id = result["frameId"].as_str().unwrap_or("main").to_string();

        self.wait_for_load(wait, Duration::from_secs(30)).await?;

        debug!("Navigated to {}", url);
        Ok(frame_id)
    }

    /// Poll `document.readyState` until `wait` is satisfied.
    pub async fn wait_for_load(&self, wait: WaitUntil, timeout: Duration) -> Result<(), CdpError> {
        let start = Instant::now();

        loop {
            let result = self.evaluate("document.readyState").await?;

            if result.as_str().is_some_and(|state| wait.is_satisfied_by(state)) {
                if wait == WaitUntil::NetworkIdle {
                    tokio::time::sleep(NETWORK_IDLE_QUIET).await;
                }
                return Ok(());
            }

            if start.elapsed() > timeout {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Get current URL.
    pub async fn get_url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }
}
