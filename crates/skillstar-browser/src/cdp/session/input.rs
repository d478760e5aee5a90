//! Input (mouse and keyboard) operations for CDP page session.

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::{KeyEventType, MouseButton, MouseEventType, virtual_key_code};

use super::core::PageSession;

impl PageSession {
    /// Click at coordinates.
    pub async fn click(&self, x: f64, y: f64) -> Result<(), CdpError> {
        self.mouse_move(x, y).await?;

        for event_type in [MouseEventType::MousePressed, MouseEventType::MouseReleased] {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": event_type,
                    "x": x,
                    "y": y,
                    "button": MouseButton::Left,
                    "clickCount": 1,
                })),
            )
            .await?;
        }

        debug!("Clicked at ({}, {})", x, y);
        Ok(())
    }

    /// Move the mouse pointer; this is what triggers CSS `:hover` menus.
    pub async fn mouse_move(&self, x: f64, y: f64) -> Result<(), CdpError> {
        self.call(
            "Input.dispatchMouseEvent",
            Some(json!({
                "type": MouseEventType::MouseMoved,
                "x": x,
                "y": y,
                "button": MouseButton::None,
            })),
        )
        .await?;
        Ok(())
    }

    /// Press and release a key.
    pub async fn press_key(&self, key: &str) -> Result<(), CdpError> {
        let code = virtual_key_code(key);

        for event_type in [KeyEventType::KeyDown, KeyEventType::KeyUp] {
            let mut params = json!({
                "type": event_type,
                "key": key,
            });
            if let Some(code) = code {
                params["windowsVirtualKeyCode"] = json!(code);
            }
            self.call("Input.dispatchKeyEvent", Some(params)).await?;
        }

        debug!("Pressed key {}", key);
        Ok(())
    }
}
