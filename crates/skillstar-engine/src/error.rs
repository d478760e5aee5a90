//! Engine error types.

use skillstar_browser::CdpError;
use thiserror::Error;

/// Failures of the Document Tree Provider.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Browser protocol failure.
    #[error("Browser error: {0}")]
    Browser(#[from] CdpError),

    /// Handle no longer resolves to a rendered element.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The page returned something that is not an element snapshot.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Failures of the student/skill/group catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown student: {0}")]
    UnknownStudent(String),
}

/// Engine error taxonomy.
///
/// `SkillNotFound`, `IconNotFound` and `DropdownTimeout` are fatal to one
/// skill only; `TargetNotFoundInDropdown` is fatal to one target only;
/// `TaskSetup` fails the whole task.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("skill not found: {0}")]
    SkillNotFound(String),

    #[error("suggestion icon not found for skill {0}")]
    IconNotFound(String),

    #[error("suggestion menu did not open for skill {0}")]
    DropdownTimeout(String),

    #[error("target not found in dropdown")]
    TargetNotFoundInDropdown,

    #[error("task setup failed: {0}")]
    TaskSetup(String),

    /// The cancellation token was raised mid-step.
    #[error("aborted by user")]
    Aborted,

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
