//! Class/Individual Partitioner.
//!
//! Native classes are toggled once as a single menu row; everyone else is
//! toggled by name. Recomputed for every task since membership changes.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::dropdown::DropdownTarget;
use crate::locator::normalize;
use crate::model::{Group, Student};

/// A student toggled on their own row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualTarget {
    pub student: Student,
    /// Selected non-native group the student came from or also belongs to.
    pub group_name: Option<String>,
}

/// Who a menu row stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRef<'a> {
    Class(&'a Group),
    Individual(&'a IndividualTarget),
}

/// Targets of one task after partitioning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetPlan {
    pub classes: Vec<Group>,
    pub individuals: Vec<IndividualTarget>,
}

impl TargetPlan {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.individuals.is_empty()
    }

    /// Menu rows to converge, classes first.
    pub fn dropdown_targets(&self) -> Vec<DropdownTarget> {
        self.classes
            .iter()
            .map(|g| DropdownTarget::class(&g.name))
            .chain(
                self.individuals
                    .iter()
                    .map(|i| DropdownTarget::student(&i.student.name)),
            )
            .collect()
    }

    /// Owners of the rows returned by [`dropdown_targets`](Self::dropdown_targets),
    /// position for position.
    pub fn targets(&self) -> impl Iterator<Item = TargetRef<'_>> {
        self.classes
            .iter()
            .map(TargetRef::Class)
            .chain(self.individuals.iter().map(TargetRef::Individual))
    }
}

/// Split the requested targets.
///
/// `student_ids` are the individually requested students, `groups` the
/// selected groups, and `students` every catalog record resolved for them
/// (requested students plus members of non-native groups). Ids without a
/// catalog record are dropped.
pub fn partition(student_ids: &[String], groups: &[Group], students: &[Student]) -> TargetPlan {
    let classes: Vec<Group> = groups.iter().filter(|g| g.is_native_class).cloned().collect();
    let local: Vec<&Group> = groups.iter().filter(|g| !g.is_native_class).collect();

    let covered: HashSet<&str> = classes
        .iter()
        .flat_map(|g| g.member_ids.iter().map(String::as_str))
        .collect();
    let by_id: HashMap<&str, &Student> = students.iter().map(|s| (s.id.as_str(), s)).collect();

    let candidates = student_ids
        .iter()
        .chain(local.iter().flat_map(|g| g.member_ids.iter()));

    let mut seen = HashSet::new();
    let mut individuals = Vec::new();
    for id in candidates {
        if covered.contains(id.as_str()) || !seen.insert(id.as_str()) {
            continue;
        }
        let Some(student) = by_id.get(id.as_str()) else {
            continue;
        };
        let group_name = local
            .iter()
            .find(|g| g.member_ids.iter().any(|m| m == id))
            .map(|g| g.name.clone());

        individuals.push(IndividualTarget {
            student: (*student).clone(),
            group_name,
        });
    }

    let mut names: HashMap<String, &str> = HashMap::new();
    for individual in &individuals {
        let key = normalize(&individual.student.name);
        if let Some(first) = names.insert(key, individual.student.id.as_str()) {
            warn!(
                name = %individual.student.name,
                first = first,
                second = %individual.student.id,
                "Two students share a menu name; both will converge the same row"
            );
        }
    }

    TargetPlan {
        classes,
        individuals,
    }
}
