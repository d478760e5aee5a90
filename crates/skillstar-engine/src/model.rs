//! Catalog records consumed by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One assignable practice skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    /// Catalog id; what task requests refer to.
    pub id: String,
    /// Category+number (`A.1`) or plan-section code (`R.5`).
    pub skill_code: String,
    /// Platform-specific id, when known.
    #[serde(default)]
    pub external_id: Option<String>,
    pub display_name: String,
    /// Name as rendered on the skill page, without decorations.
    #[serde(default)]
    pub clean_name: String,
    pub subject: String,
    pub grade_level: String,
}

impl SkillDescriptor {
    /// Name used for text matching.
    pub fn match_name(&self) -> &str {
        if self.clean_name.trim().is_empty() {
            &self.display_name
        } else {
            &self.clean_name
        }
    }

    /// Progress label, e.g. `A.1 Count to 10`.
    pub fn label(&self) -> String {
        format!("{} {}", self.skill_code, self.display_name)
    }
}

/// A student known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    /// Name as it appears in the suggestion menu.
    pub name: String,
    #[serde(default)]
    pub default_grade: Option<String>,
    #[serde(default)]
    pub default_subject: Option<String>,
}

/// A named set of students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    /// Member student ids, in catalog order.
    #[serde(default)]
    pub member_ids: Vec<String>,
    /// Addressable as a single row in the suggestion menu.
    #[serde(default)]
    pub is_native_class: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Success,
    Failed,
}

/// One persisted assignment row; always per student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub student_id: String,
    pub skill_id: String,
    pub status: HistoryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Shared by every row produced by one task.
    pub batch_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
