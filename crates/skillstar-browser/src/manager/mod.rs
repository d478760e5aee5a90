//! Browser lifecycle: attach to or launch Chrome, own the shared page
//! session, and tear everything down within a bounded grace period.

mod manager_core;
mod manager_types;

pub use manager_core::BrowserManager;
pub use manager_types::BrowserError;

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
