//! Selector-addressed DOM helpers for CDP page session.
//!
//! Elements are addressed by CSS selector and resolved inside the page on
//! every call, so a handle never outlives a re-render of its node.

use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::json;

use crate::cdp::error::CdpError;

use super::core::PageSession;

/// Viewport-relative center of a rendered element.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(super) struct Center {
    pub x: f64,
    pub y: f64,
}

const CENTER_FN: &str = r#"function (sel) {
  const el = document.querySelector(sel);
  if (!el) return null;
  if (el.scrollIntoViewIfNeeded) { el.scrollIntoViewIfNeeded(true); } else { el.scrollIntoView({block: 'center'}); }
  const r = el.getBoundingClientRect();
  if (r.width === 0 && r.height === 0) return null;
  return { x: r.left + r.width / 2, y: r.top + r.height / 2 };
}"#;

const VISIBLE_FN: &str = r#"function (sel) {
  return Array.from(document.querySelectorAll(sel)).some(el => {
    const s = window.getComputedStyle(el);
    const r = el.getBoundingClientRect();
    return s.display !== 'none' && s.visibility !== 'hidden' && s.opacity !== '0' && r.width > 0 && r.height > 0;
  });
}"#;

impl PageSession {
    /// Scroll the element into view and return its center, if rendered.
    pub(super) async fn element_center(&self, selector: &str) -> Result<Option<Center>, CdpError> {
        let value = self.call_function(CENTER_FN, &[json!(selector)]).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Move the pointer over the element matching `selector`.
    pub async fn hover_selector(&self, selector: &str) -> Result<(), CdpError> {
        let center = self
            .element_center(selector)
            .await?
            .ok_or_else(|| CdpError::ElementNotFound(selector.to_string()))?;
        self.mouse_move(center.x, center.y).await
    }

    /// Click the element matching `selector` at its center.
    pub async fn click_selector(&self, selector: &str) -> Result<(), CdpError> {
        let center = self
            .element_center(selector)
            .await?
            .ok_or_else(|| CdpError::ElementNotFound(format!("{} (not visible)", selector)))?;
        self.click(center.x, center.y).await
    }

    /// Whether any element matching `selector` is currently visible.
    pub async fn is_visible(&self, selector: &str) -> Result<bool, CdpError> {
        let value = self.call_function(VISIBLE_FN, &[json!(selector)]).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Poll until an element matching `selector` is visible; `false` on timeout.
    pub async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<bool, CdpError> {
        let start = Instant::now();

        loop {
            if self.is_visible(selector).await? {
                return Ok(true);
            }

            if start.elapsed() >= timeout {
                return Ok(false);
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
