//! Page session handle and command dispatch.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cdp::client::Transport;
use crate::cdp::error::CdpError;
use crate::cdp::protocol::CdpResponse;

/// The one tab Skillstar drives, attached in flat-session mode.
pub struct PageSession {
    pub(super) target_id: String,
    pub(super) session_id: String,
    pub(super) transport: Arc<Transport>,
    /// Page events are not consumed; holding the receiver keeps the
    /// transport's event routing for this session alive.
    pub(super) _event_rx: mpsc::UnboundedReceiver<CdpResponse>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        transport: Arc<Transport>,
        event_rx: mpsc::UnboundedReceiver<CdpResponse>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            transport,
            _event_rx: event_rx,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send one command scoped to this page.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    /// Page, DOM and Runtime must be on before navigation and evaluation work.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        for domain in ["Page.enable", "DOM.enable", "Runtime.enable"] {
            self.call(domain, None).await?;
        }

        debug!(
            target_id = %self.target_id,
            session_id = %self.session_id,
            "Page session ready"
        );
        Ok(())
    }
}
