//! Turns task results into per-student history rows.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use skillstar_queue::ResultRecord;

use crate::model::{HistoryEntry, HistoryStatus, SkillDescriptor};
use crate::partition::{TargetPlan, TargetRef};

/// Records produced for one skill, one per dropdown target in plan order.
#[derive(Debug, Clone)]
pub struct SkillAttempt {
    pub skill: SkillDescriptor,
    pub records: Vec<ResultRecord>,
}

/// Last-used subject and grade for a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDefaults {
    pub student_id: String,
    pub grade: String,
    pub subject: String,
}

/// One row per student per attempted skill.
///
/// Records are matched to their owners by position, never by display text:
/// skill codes repeat across grades and students may share a name. Class
/// results fan out to every current member of the class and carry the class
/// name; individual results carry the local group name, if any. All rows
/// share `batch_id`.
pub fn fan_out(
    attempts: &[SkillAttempt],
    plan: &TargetPlan,
    batch_id: Uuid,
    recorded_at: DateTime<Utc>,
) -> Vec<HistoryEntry> {
    let mut entries = Vec::new();

    for attempt in attempts {
        for (target, record) in plan.targets().zip(&attempt.records) {
            let status = if record.success {
                HistoryStatus::Success
            } else {
                HistoryStatus::Failed
            };
            let entry = |student_id: &str, group_name: Option<String>| HistoryEntry {
                student_id: student_id.to_string(),
                skill_id: attempt.skill.id.clone(),
                status,
                error_message: record.error.clone(),
                batch_id,
                group_name,
                recorded_at,
            };

            match target {
                TargetRef::Class(class) => entries.extend(
                    class
                        .member_ids
                        .iter()
                        .map(|id| entry(id, Some(class.name.clone()))),
                ),
                TargetRef::Individual(individual) => {
                    entries.push(entry(&individual.student.id, individual.group_name.clone()))
                }
            }
        }
    }

    entries
}

/// Subject and grade of the last successful skill of each student.
pub fn student_defaults(attempts: &[SkillAttempt], entries: &[HistoryEntry]) -> Vec<StudentDefaults> {
    let mut out: Vec<StudentDefaults> = Vec::new();

    for entry in entries.iter().filter(|e| e.status == HistoryStatus::Success) {
        let Some(attempt) = attempts.iter().find(|a| a.skill.id == entry.skill_id) else {
            continue;
        };
        let defaults = StudentDefaults {
            student_id: entry.student_id.clone(),
            grade: attempt.skill.grade_level.clone(),
            subject: attempt.skill.subject.clone(),
        };
        match out.iter_mut().find(|d| d.student_id == entry.student_id) {
            Some(existing) => *existing = defaults,
            None => out.push(defaults),
        }
    }

    out
}
