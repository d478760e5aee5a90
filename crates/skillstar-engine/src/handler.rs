//! Assignment handler: the [`TaskHandler`] that drives the page for one batch.
//!
//! Setup resolves targets and skills from the catalog; any failure there fails
//! the task. After that, every skill is attempted in request order and its
//! failures are recorded per target without stopping the batch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use skillstar_browser::WaitUntil;
use skillstar_config::{Config, LayoutConfig, PlatformConfig};
use skillstar_queue::{
    CancellationToken, ProgressUpdate, QueueError, ResultRecord, SuggestAction, Task, TaskContext,
    TaskHandler, TaskOutcome,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::dropdown::{DropdownController, DropdownTarget};
use crate::error::EngineError;
use crate::history::{SkillAttempt, fan_out, student_defaults};
use crate::locator::Resolver;
use crate::model::{Group, SkillDescriptor};
use crate::partition::{TargetPlan, partition};
use crate::tree::DocumentTree;

/// Everything setup produced for one task.
struct Batch {
    plan: TargetPlan,
    targets: Vec<DropdownTarget>,
    skills: Vec<SkillDescriptor>,
}

/// Runs assignment tasks against a document tree and a catalog.
pub struct AssignmentHandler {
    tree: Arc<dyn DocumentTree>,
    catalog: Arc<dyn Catalog>,
    platform: PlatformConfig,
    layout: LayoutConfig,
    resolver: Resolver,
    dropdown: DropdownController,
    /// URL currently loaded in the tree by the running task.
    loaded: Mutex<Option<String>>,
}

impl AssignmentHandler {
    pub fn new(tree: Arc<dyn DocumentTree>, catalog: Arc<dyn Catalog>, config: &Config) -> Self {
        Self {
            tree,
            catalog,
            platform: config.platform.clone(),
            layout: config.layout.clone(),
            resolver: Resolver::new(config.platform.clone(), config.layout.clone()),
            dropdown: DropdownController::new(config.layout.clone(), config.dropdown.clone()),
            loaded: Mutex::new(None),
        }
    }

    async fn setup(&self, task: &Task) -> Result<Batch, EngineError> {
        let all_groups = self.catalog.groups().await?;
        let mut groups: Vec<Group> = Vec::new();
        for name in &task.targets.group_names {
            match all_groups.iter().find(|g| &g.name == name) {
                Some(group) => groups.push(group.clone()),
                None => warn!(group = %name, "Unknown group, skipping"),
            }
        }

        let mut student_ids = task.targets.student_ids.clone();
        for group in groups.iter().filter(|g| !g.is_native_class) {
            for id in &group.member_ids {
                if !student_ids.contains(id) {
                    student_ids.push(id.clone());
                }
            }
        }
        let students = self.catalog.students_by_ids(&student_ids).await?;

        let plan = partition(&task.targets.student_ids, &groups, &students);
        if plan.is_empty() {
            return Err(EngineError::TaskSetup("no valid students or groups".to_string()));
        }

        let skills = self.catalog.skills_by_ids(&task.skill_ids).await?;
        if skills.is_empty() {
            return Err(EngineError::TaskSetup("no valid skills".to_string()));
        }
        if skills.len() < task.skill_ids.len() {
            warn!(
                requested = task.skill_ids.len(),
                found = skills.len(),
                "Some requested skills are not in the catalog"
            );
        }

        info!(
            classes = plan.classes.len(),
            individuals = plan.individuals.len(),
            skills = skills.len(),
            "Task setup complete"
        );

        Ok(Batch {
            targets: plan.dropdown_targets(),
            plan,
            skills,
        })
    }

    /// Bring the page for `skill` into the tree unless it is already there.
    async fn ensure_page(&self, skill: &SkillDescriptor, plan_based: bool) -> Result<(), EngineError> {
        let url = if plan_based {
            self.platform.plan_url(&skill.subject)
        } else {
            self.platform.category_url(&skill.subject, &skill.grade_level)
        };

        if self.loaded.lock().as_deref() == Some(url.as_str()) {
            return Ok(());
        }

        debug!(url = %url, "Loading skill page");
        self.tree.navigate(&url, WaitUntil::Load).await?;
        let ready = self
            .tree
            .wait_for_visible(
                &self.layout.skill_row,
                Duration::from_millis(self.platform.page_ready_timeout_ms),
            )
            .await?;
        if !ready {
            warn!(url = %url, "No skill rows rendered before timeout");
        }

        *self.loaded.lock() = Some(url);
        Ok(())
    }

    async fn run_skill(
        &self,
        skill: &SkillDescriptor,
        targets: &[DropdownTarget],
        action: SuggestAction,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultRecord>, EngineError> {
        let plan_based = self.platform.is_plan_subject(&skill.subject);
        self.ensure_page(skill, plan_based).await?;

        if cancel.is_cancelled() {
            return Err(EngineError::Aborted);
        }

        let element = self
            .resolver
            .resolve(self.tree.as_ref(), skill, plan_based)
            .await?;
        self.tree.scroll_into_view(&element).await?;

        self.dropdown
            .apply_toggles(
                self.tree.as_ref(),
                &element,
                &skill.skill_code,
                targets,
                action,
                cancel,
            )
            .await
    }

    /// Write history rows and student defaults. Failures are logged only.
    async fn persist(&self, attempts: &[SkillAttempt], batch: &Batch) {
        if attempts.is_empty() {
            return;
        }

        let entries = fan_out(attempts, &batch.plan, Uuid::new_v4(), Utc::now());
        for entry in &entries {
            if let Err(e) = self.catalog.record_history(entry).await {
                warn!(student = %entry.student_id, "Failed to record history: {}", e);
            }
        }

        for defaults in student_defaults(attempts, &entries) {
            if let Err(e) = self
                .catalog
                .update_student_defaults(&defaults.student_id, &defaults.grade, &defaults.subject)
                .await
            {
                warn!(student = %defaults.student_id, "Failed to update student defaults: {}", e);
            }
        }

        debug!(rows = entries.len(), "History recorded");
    }
}

fn setup_error(e: EngineError) -> QueueError {
    match e {
        EngineError::TaskSetup(reason) => QueueError::Setup(reason),
        other => QueueError::Setup(other.to_string()),
    }
}

#[async_trait]
impl TaskHandler for AssignmentHandler {
    async fn handle(&self, task: &Task, ctx: TaskContext) -> Result<TaskOutcome, QueueError> {
        if ctx.cancel.is_cancelled() {
            info!("Cancelled before start");
            return Ok(TaskOutcome::aborted(Vec::new()));
        }

        *self.loaded.lock() = None;
        let batch = self.setup(task).await.map_err(setup_error)?;

        if ctx.cancel.is_cancelled() {
            info!("Cancelled during setup");
            return Ok(TaskOutcome::aborted(Vec::new()));
        }

        let mut attempts = Vec::new();
        let mut aborted = false;

        for (index, skill) in batch.skills.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                aborted = true;
                break;
            }

            let records = match self
                .run_skill(skill, &batch.targets, task.action, &ctx.cancel)
                .await
            {
                Ok(records) => records,
                Err(EngineError::Aborted) => {
                    aborted = true;
                    break;
                }
                Err(e) => {
                    warn!(skill = %skill.skill_code, "Skill failed: {}", e);
                    // Page state is unknown after a failure; reload for the next skill.
                    *self.loaded.lock() = None;
                    let reason = e.to_string();
                    batch
                        .targets
                        .iter()
                        .map(|t| {
                            ResultRecord::failure(&t.name, &skill.skill_code, t.is_class, reason.as_str())
                        })
                        .collect()
                }
            };
            attempts.push(SkillAttempt {
                skill: skill.clone(),
                records,
            });

            ctx.progress.report(ProgressUpdate {
                current: index + 1,
                total: task.total,
                current_skill_label: skill.label(),
            });
        }

        self.persist(&attempts, &batch).await;

        let results: Vec<ResultRecord> = attempts.into_iter().flat_map(|a| a.records).collect();

        if aborted {
            info!(results = results.len(), "Task aborted");
            Ok(TaskOutcome::aborted(results))
        } else {
            Ok(TaskOutcome::completed(results))
        }
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
