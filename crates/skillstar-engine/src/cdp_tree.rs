//! [`DocumentTree`] backed by a CDP page session.
//!
//! `find` stamps every matched element with a `data-skillstar-ref` attribute
//! and hands back a selector for that stamp, so a handle keeps pointing at
//! the same node while a virtualized list re-renders around it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use skillstar_browser::{PageSession, WaitUntil};
use tracing::debug;

use crate::error::TreeError;
use crate::tree::{DocumentTree, ElementRef, NodeSnapshot, Query};

const FIND_FN: &str = r#"function (scope, sel) {
  const root = scope ? document.querySelector(scope) : document;
  if (!root) return null;
  window.__skillstarRef = window.__skillstarRef || 0;
  return Array.from(root.querySelectorAll(sel)).map(el => {
    let ref = el.getAttribute('data-skillstar-ref');
    if (!ref) {
      window.__skillstarRef += 1;
      ref = String(window.__skillstarRef);
      el.setAttribute('data-skillstar-ref', ref);
    }
    const attributes = {};
    for (const a of el.attributes) attributes[a.name] = a.value;
    return {
      handle: '[data-skillstar-ref="' + ref + '"]',
      tag: el.tagName.toLowerCase(),
      text: (el.innerText || el.textContent || '').trim(),
      classes: Array.from(el.classList),
      attributes,
    };
  });
}"#;

const INSPECT_FN: &str = r#"function (sel, depth) {
  const el = document.querySelector(sel);
  if (!el) return null;
  const snap = (node, d) => {
    const attributes = {};
    for (const a of node.attributes) attributes[a.name] = a.value;
    return {
      handle: '',
      tag: node.tagName.toLowerCase(),
      text: (node.innerText || node.textContent || '').trim(),
      classes: Array.from(node.classList),
      attributes,
      children: d > 0 ? Array.from(node.children).map(c => snap(c, d - 1)) : [],
    };
  };
  const out = snap(el, depth);
  out.handle = sel;
  return out;
}"#;

const DISPATCH_HOVER_FN: &str = r#"function (sel) {
  const el = document.querySelector(sel);
  if (!el) return false;
  for (const type of ['mouseenter', 'mouseover', 'mousemove']) {
    el.dispatchEvent(new MouseEvent(type, { bubbles: type !== 'mouseenter', cancelable: true, view: window }));
  }
  return true;
}"#;

const SCROLL_INTO_VIEW_FN: &str = r#"function (sel) {
  const el = document.querySelector(sel);
  if (!el) return false;
  el.scrollIntoView({ block: 'center', inline: 'nearest' });
  return true;
}"#;

const SCROLL_BY_FN: &str = r#"function (sel, dy) {
  const el = document.querySelector(sel);
  if (!el) return false;
  el.scrollTop = el.scrollTop + dy;
  el.dispatchEvent(new Event('scroll', { bubbles: true }));
  return true;
}"#;

/// Subtree depth captured by `inspect`; toggle markup is shallow.
const INSPECT_DEPTH: u32 = 4;

/// Document tree over the shared browser page.
pub struct CdpTree {
    page: Arc<PageSession>,
}

impl CdpTree {
    pub fn new(page: Arc<PageSession>) -> Self {
        Self { page }
    }

    async fn call_on(
        &self,
        function: &str,
        element: &ElementRef,
        extra: &[Value],
    ) -> Result<(), TreeError> {
        let mut args = vec![json!(element.selector())];
        args.extend_from_slice(extra);
        let found = self.page.call_function(function, &args).await?;
        if found.as_bool().unwrap_or(false) {
            Ok(())
        } else {
            Err(TreeError::ElementNotFound(element.to_string()))
        }
    }
}

#[async_trait]
impl DocumentTree for CdpTree {
    async fn navigate(&self, url: &str, wait: WaitUntil) -> Result<(), TreeError> {
        let frame = self.page.navigate(url, wait).await?;
        debug!(url, frame = %frame, "Navigated");
        Ok(())
    }

    async fn find(&self, query: &Query) -> Result<Vec<NodeSnapshot>, TreeError> {
        let scope = query.scope.as_ref().map(|s| s.selector().to_string());
        let value = self
            .page
            .call_function(FIND_FN, &[json!(scope), json!(query.selector)])
            .await?;

        if value.is_null() {
            // Scope vanished between calls.
            return match &query.scope {
                Some(scope) => Err(TreeError::ElementNotFound(scope.to_string())),
                None => Ok(Vec::new()),
            };
        }

        serde_json::from_value(value).map_err(|e| TreeError::InvalidSnapshot(e.to_string()))
    }

    async fn inspect(&self, element: &ElementRef) -> Result<NodeSnapshot, TreeError> {
        let value = self
            .page
            .call_function(INSPECT_FN, &[json!(element.selector()), json!(INSPECT_DEPTH)])
            .await?;

        if value.is_null() {
            return Err(TreeError::ElementNotFound(element.to_string()));
        }
        serde_json::from_value(value).map_err(|e| TreeError::InvalidSnapshot(e.to_string()))
    }

    async fn hover(&self, element: &ElementRef) -> Result<(), TreeError> {
        Ok(self.page.hover_selector(element.selector()).await?)
    }

    async fn dispatch_hover(&self, element: &ElementRef) -> Result<(), TreeError> {
        self.call_on(DISPATCH_HOVER_FN, element, &[]).await
    }

    async fn click(&self, element: &ElementRef) -> Result<(), TreeError> {
        Ok(self.page.click_selector(element.selector()).await?)
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), TreeError> {
        self.call_on(SCROLL_INTO_VIEW_FN, element, &[]).await
    }

    async fn scroll_by(&self, element: &ElementRef, delta_y: f64) -> Result<(), TreeError> {
        self.call_on(SCROLL_BY_FN, element, &[json!(delta_y)]).await
    }

    async fn press_key(&self, key: &str) -> Result<(), TreeError> {
        Ok(self.page.press_key(key).await?)
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<bool, TreeError> {
        Ok(self.page.wait_for_visible(selector, timeout).await?)
    }

    async fn wait_for_timeout(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
