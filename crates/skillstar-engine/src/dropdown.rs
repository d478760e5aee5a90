//! Suggestion Dropdown Controller.
//!
//! Opens a skill's student menu and converges every target's star to the
//! desired state. The menu is virtualized: rows render only near the scroll
//! position, so targets are searched in passes with a scroll between them.

use std::time::Duration;

use skillstar_config::{DropdownConfig, LayoutConfig};
use skillstar_queue::{CancellationToken, ResultRecord, SuggestAction};
use tracing::{debug, warn};

use crate::error::{EngineError, TreeError};
use crate::locator::normalize;
use crate::toggle::is_toggled_on;
use crate::tree::{DocumentTree, ElementRef, NodeSnapshot, Query};

/// One row to converge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownTarget {
    /// Text of the menu row.
    pub name: String,
    pub is_class: bool,
}

impl DropdownTarget {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_class: true,
        }
    }

    pub fn student(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_class: false,
        }
    }
}

/// What happened to one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Already in the desired state.
    Unchanged,
    /// Star clicked.
    Toggled,
    /// No star control; the row itself was clicked.
    RowClicked,
}

pub struct DropdownController {
    layout: LayoutConfig,
    config: DropdownConfig,
}

impl DropdownController {
    pub fn new(layout: LayoutConfig, config: DropdownConfig) -> Self {
        Self { layout, config }
    }

    /// Open the menu of `skill`, converge every target, close the menu.
    ///
    /// Returns one record per target, in target order. Fails as a whole only
    /// when the menu cannot be opened or the task is cancelled.
    pub async fn apply_toggles(
        &self,
        tree: &dyn DocumentTree,
        skill: &ElementRef,
        skill_code: &str,
        targets: &[DropdownTarget],
        action: SuggestAction,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultRecord>, EngineError> {
        let result = match self.open(tree, skill, skill_code).await {
            Ok(()) => {
                self.converge(tree, skill_code, targets, action, cancel)
                    .await
            }
            Err(e) => Err(e),
        };

        self.close(tree).await;
        result
    }

    async fn open(
        &self,
        tree: &dyn DocumentTree,
        skill: &ElementRef,
        skill_code: &str,
    ) -> Result<(), EngineError> {
        let icon = tree
            .find(&Query::within(skill, &self.layout.suggestion_icon))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::IconNotFound(skill_code.to_string()))?;

        let wait = Duration::from_millis(self.config.open_wait_ms);

        tree.hover(&icon.handle).await?;
        if tree.wait_for_visible(&self.layout.menu_marker, wait).await? {
            return Ok(());
        }

        debug!(skill = skill_code, "Menu did not open on hover, dispatching hover events");
        tree.dispatch_hover(&icon.handle).await?;
        if tree.wait_for_visible(&self.layout.menu_marker, wait).await? {
            return Ok(());
        }

        Err(EngineError::DropdownTimeout(skill_code.to_string()))
    }

    async fn converge(
        &self,
        tree: &dyn DocumentTree,
        skill_code: &str,
        targets: &[DropdownTarget],
        action: SuggestAction,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultRecord>, EngineError> {
        let desired = action.desired_state();
        let mut records: Vec<Option<ResultRecord>> = vec![None; targets.len()];
        let max = self.config.max_scroll_iterations;

        for iteration in 0..max {
            if cancel.is_cancelled() {
                return Err(EngineError::Aborted);
            }

            let rows = self.rendered_rows(tree).await?;
            for (target, slot) in targets.iter().zip(records.iter_mut()) {
                if slot.is_some() {
                    continue;
                }
                let wanted = normalize(&target.name);
                let Some((row, _)) = rows.iter().find(|(_, label)| *label == wanted) else {
                    continue;
                };

                let record = match self.apply_one(tree, row, desired).await {
                    Ok(outcome) => {
                        debug!(skill = skill_code, target_name = %target.name, ?outcome, "Target converged");
                        ResultRecord::success(&target.name, skill_code, target.is_class)
                    }
                    Err(e) => {
                        warn!(skill = skill_code, target_name = %target.name, "Toggle failed: {}", e);
                        ResultRecord::failure(&target.name, skill_code, target.is_class, e.to_string())
                    }
                };
                *slot = Some(record);
            }

            if records.iter().all(Option::is_some) {
                break;
            }
            if iteration + 1 < max {
                self.scroll_menu(tree).await?;
            }
        }

        Ok(targets
            .iter()
            .zip(records)
            .map(|(target, record)| {
                record.unwrap_or_else(|| {
                    ResultRecord::failure(
                        &target.name,
                        skill_code,
                        target.is_class,
                        EngineError::TargetNotFoundInDropdown.to_string(),
                    )
                })
            })
            .collect())
    }

    /// Currently rendered menu rows with their normalized labels.
    async fn rendered_rows(
        &self,
        tree: &dyn DocumentTree,
    ) -> Result<Vec<(NodeSnapshot, String)>, TreeError> {
        let mut rows = Vec::new();
        for row in tree.find(&Query::all(&self.layout.menu_row)).await? {
            let label = tree
                .find(&Query::within(&row.handle, &self.layout.row_label))
                .await?
                .into_iter()
                .next()
                .map(|l| l.text)
                .unwrap_or_else(|| row.text.clone());
            rows.push((row, normalize(&label)));
        }
        Ok(rows)
    }

    async fn apply_one(
        &self,
        tree: &dyn DocumentTree,
        row: &NodeSnapshot,
        desired: bool,
    ) -> Result<ToggleOutcome, TreeError> {
        let toggle = tree
            .find(&Query::within(&row.handle, &self.layout.toggle))
            .await?
            .into_iter()
            .next();

        let Some(toggle) = toggle else {
            // State cannot be read; click and trust it.
            tree.click(&row.handle).await?;
            self.settle(tree).await;
            return Ok(ToggleOutcome::RowClicked);
        };

        let row_snapshot = tree.inspect(&row.handle).await?;
        let toggle_snapshot = tree.inspect(&toggle.handle).await?;
        if is_toggled_on(&row_snapshot, &toggle_snapshot) == desired {
            return Ok(ToggleOutcome::Unchanged);
        }

        tree.click(&toggle.handle).await?;
        self.settle(tree).await;
        Ok(ToggleOutcome::Toggled)
    }

    async fn scroll_menu(&self, tree: &dyn DocumentTree) -> Result<(), TreeError> {
        let list = tree
            .find(&Query::all(&self.layout.menu_list))
            .await?
            .into_iter()
            .next();

        if let Some(list) = list {
            tree.scroll_by(&list.handle, f64::from(self.config.scroll_increment_px))
                .await?;
        }
        self.settle(tree).await;
        Ok(())
    }

    async fn settle(&self, tree: &dyn DocumentTree) {
        tree.wait_for_timeout(Duration::from_millis(self.config.settle_ms))
            .await;
    }

    /// Best effort; a menu that will not close is left for the next navigation.
    async fn close(&self, tree: &dyn DocumentTree) {
        if let Err(e) = tree.press_key(&self.config.close_key).await {
            warn!("Failed to dismiss suggestion menu: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "dropdown_tests.rs"]
mod tests;
