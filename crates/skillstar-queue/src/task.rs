//! Task definition and status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QueueError;

/// Task identifier.
pub type TaskId = Uuid;

/// Desired suggestion state for every target of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestAction {
    /// The star must end up on.
    Suggest,
    /// The star must end up off.
    Unsuggest,
}

impl SuggestAction {
    /// Toggle state the target must converge to.
    pub fn desired_state(self) -> bool {
        matches!(self, SuggestAction::Suggest)
    }
}

impl std::str::FromStr for SuggestAction {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "suggest" => Ok(SuggestAction::Suggest),
            "unsuggest" => Ok(SuggestAction::Unsuggest),
            other => Err(QueueError::InvalidRequest(format!("unknown action '{}'", other))),
        }
    }
}

/// Who a task is applied to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTargets {
    /// Individually requested students.
    #[serde(default)]
    pub student_ids: Vec<String>,
    /// Requested groups, by display name.
    #[serde(default)]
    pub group_names: Vec<String>,
}

impl TaskTargets {
    pub fn is_empty(&self) -> bool {
        self.student_ids.is_empty() && self.group_names.is_empty()
    }
}

/// Task status.
///
/// `Queued → Processing → {Completed | Failed | Aborted}`; a queued task may
/// also go straight to `Aborted` or `Failed`. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Aborted,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Aborted
        )
    }

    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Queued => matches!(
                next,
                TaskStatus::Processing | TaskStatus::Aborted | TaskStatus::Failed
            ),
            TaskStatus::Processing => next.is_terminal(),
            _ => false,
        }
    }
}

/// Outcome of one (target × skill) attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub target_name: String,
    pub skill_code: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub is_class_target: bool,
}

impl ResultRecord {
    pub fn success(
        target_name: impl Into<String>,
        skill_code: impl Into<String>,
        is_class_target: bool,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            skill_code: skill_code.into(),
            success: true,
            error: None,
            is_class_target,
        }
    }

    pub fn failure(
        target_name: impl Into<String>,
        skill_code: impl Into<String>,
        is_class_target: bool,
        error: impl Into<String>,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            skill_code: skill_code.into(),
            success: false,
            error: Some(error.into()),
            is_class_target,
        }
    }
}

/// A batch submission: many skills × many targets, one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub targets: TaskTargets,
    pub skill_ids: Vec<String>,
    pub action: SuggestAction,
}

impl TaskRequest {
    pub fn new(targets: TaskTargets, skill_ids: Vec<String>, action: SuggestAction) -> Self {
        Self {
            targets,
            skill_ids,
            action,
        }
    }

    /// Reject requests that could never do anything.
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.skill_ids.is_empty() {
            return Err(QueueError::InvalidRequest("no skills requested".to_string()));
        }
        if self.targets.is_empty() {
            return Err(QueueError::InvalidRequest(
                "no students or groups requested".to_string(),
            ));
        }
        Ok(())
    }
}

/// A task in the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID.
    pub id: TaskId,
    pub targets: TaskTargets,
    /// Skills in request order.
    pub skill_ids: Vec<String>,
    pub action: SuggestAction,
    pub status: TaskStatus,
    /// Skills processed so far; never exceeds `total`.
    pub progress: usize,
    /// Number of requested skills.
    pub total: usize,
    pub current_skill_label: Option<String>,
    pub results: Vec<ResultRecord>,
    /// Task-level failure reason.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a queued task from a request.
    pub fn new(request: TaskRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            total: request.skill_ids.len(),
            targets: request.targets,
            skill_ids: request.skill_ids,
            action: request.action,
            status: TaskStatus::Queued,
            progress: 0,
            current_skill_label: None,
            results: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, refusing backwards or post-terminal transitions.
    pub fn transition(&mut self, next: TaskStatus) -> Result<(), QueueError> {
        if !self.status.can_transition_to(next) {
            return Err(QueueError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record progress, clamped to `total`.
    pub fn record_progress(&mut self, current: usize, label: Option<String>) {
        self.progress = current.min(self.total);
        self.current_skill_label = label;
        self.updated_at = Utc::now();
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.succeeded_count()
    }
}
