//! Browser session plumbing for Skillstar.
//!
//! Drives a Chrome/Chromium instance over the Chrome DevTools Protocol (CDP).
//! One long-lived page session is shared by every assignment task; the
//! scheduler upstream guarantees that only one task touches it at a time.
//!
//! ```text
//! ┌─────────────────┐    WebSocket     ┌──────────────────┐
//! │  skillstar      │ ◄──────────────► │   Chrome/Edge    │
//! │  (this crate)   │       CDP        │  (user profile)  │
//! └─────────────────┘                  └──────────────────┘
//! ```
//!
//! Chrome is launched with a persistent profile directory so that a login
//! performed once by hand survives across runs.

pub mod cdp;
pub mod manager;

pub use cdp::{CdpClient, CdpError, PageSession, WaitUntil};
pub use manager::{BrowserError, BrowserManager};
