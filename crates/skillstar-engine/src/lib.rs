//! # Skillstar Engine
//!
//! Finds a skill on the platform's rendered pages and converges the
//! suggestion star of every selected class or student to the requested state.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  AssignmentHandler                       │
//! │  setup ─► per skill: navigate ─► resolve ─► dropdown     │
//! │        ─► history fan-out                                │
//! └──────┬───────────────┬──────────────────┬────────────────┘
//!        │               │                  │
//!  ┌─────▼─────┐   ┌─────▼──────┐    ┌──────▼─────────┐
//!  │ Catalog   │   │ Resolver   │    │ Dropdown       │
//!  │ (memory / │   │ (snapshot +│    │ Controller     │
//!  │  file)    │   │ strategies)│    │ (toggle state) │
//!  └───────────┘   └─────┬──────┘    └──────┬─────────┘
//!                        │                  │
//!                  ┌─────▼──────────────────▼─────┐
//!                  │     DocumentTree (CdpTree)   │
//!                  └──────────────────────────────┘
//! ```

pub mod catalog;
pub mod cdp_tree;
pub mod dropdown;
pub mod error;
pub mod handler;
pub mod history;
pub mod locator;
pub mod model;
pub mod partition;
pub mod skill_code;
pub mod toggle;
pub mod tree;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{Catalog, CatalogData, FileCatalog, MemoryCatalog};
pub use cdp_tree::CdpTree;
pub use dropdown::{DropdownController, DropdownTarget, ToggleOutcome};
pub use error::{CatalogError, EngineError, TreeError};
pub use handler::AssignmentHandler;
pub use history::SkillAttempt;
pub use locator::Resolver;
pub use model::{Group, HistoryEntry, HistoryStatus, SkillDescriptor, Student};
pub use partition::{IndividualTarget, TargetPlan, TargetRef, partition};
pub use skill_code::SkillCode;
pub use toggle::is_toggled_on;
pub use tree::{DocumentTree, ElementRef, NodeSnapshot, Query};
