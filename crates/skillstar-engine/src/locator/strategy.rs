//! Ordered locator strategies.
//!
//! Each strategy is a pure function over a [`SkillPage`]. A chain tries them
//! in order and the first hit wins; within a strategy the first row in
//! document order wins.

use crate::locator::snapshot::{Section, SkillPage, SkillRow};
use crate::skill_code::SkillCode;
use crate::tree::ElementRef;

/// What the strategies know about the skill being located.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub code: SkillCode,
    /// Clean name, or display name when there is none.
    pub name: String,
    pub display_name: String,
    /// External id, already filtered against excluded prefixes.
    pub external_id: Option<String>,
    /// Expected plan section header.
    pub section_label: Option<String>,
}

pub type Strategy = fn(&SkillPage, &ResolveRequest) -> Option<ElementRef>;

/// Which strategy matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub strategy: &'static str,
    pub element: ElementRef,
}

/// First-match chain of strategies.
pub struct LocatorChain {
    steps: Vec<(&'static str, Strategy)>,
}

impl LocatorChain {
    pub fn new(steps: Vec<(&'static str, Strategy)>) -> Self {
        Self { steps }
    }

    /// Section-keyed skill plans: id, then name, then position.
    pub fn plan() -> Self {
        Self::new(vec![
            ("plan-id", plan_by_id),
            ("plan-name", plan_by_name),
            ("plan-position", plan_by_position),
        ])
    }

    /// Grade-level skill trees: number marker, then name, then page-wide text.
    pub fn category() -> Self {
        Self::new(vec![
            ("category-number", category_by_number),
            ("category-name", category_by_name),
            ("global-name", global_by_name),
        ])
    }

    pub fn resolve(&self, page: &SkillPage, request: &ResolveRequest) -> Option<Resolution> {
        self.steps.iter().find_map(|(name, strategy)| {
            strategy(page, request).map(|element| Resolution {
                strategy: *name,
                element,
            })
        })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|(name, _)| *name).collect()
    }
}

/// Lowercase and collapse whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn name_equals(row: &SkillRow, request: &ResolveRequest) -> bool {
    let row_name = normalize(&row.name);
    !row_name.is_empty()
        && (row_name == normalize(&request.name) || row_name == normalize(&request.display_name))
}

fn plan_section<'p>(page: &'p SkillPage, request: &ResolveRequest) -> Option<&'p Section> {
    let label = normalize(request.section_label.as_deref()?);
    page.sections.iter().find(|s| {
        let header = normalize(&s.header);
        header == label || header.starts_with(&format!("{} ", label))
    })
}

fn category_section<'p>(page: &'p SkillPage, request: &ResolveRequest) -> Option<&'p Section> {
    let prefix = format!("{}.", normalize(request.code.prefix()));
    page.sections
        .iter()
        .find(|s| normalize(&s.header).starts_with(&prefix))
}

/// Trailing integer of a number marker: `5`, `5.`, `A.5` all give 5.
fn marker_number(marker: &str) -> Option<u32> {
    marker
        .trim()
        .trim_end_matches('.')
        .rsplit('.')
        .next()
        .and_then(|s| s.trim().parse().ok())
}

pub fn plan_by_id(page: &SkillPage, request: &ResolveRequest) -> Option<ElementRef> {
    let id = request.external_id.as_deref()?;
    plan_section(page, request)?
        .rows
        .iter()
        .find(|r| r.external_id.as_deref() == Some(id))
        .map(|r| r.handle.clone())
}

pub fn plan_by_name(page: &SkillPage, request: &ResolveRequest) -> Option<ElementRef> {
    plan_section(page, request)?
        .rows
        .iter()
        .find(|r| name_equals(r, request))
        .map(|r| r.handle.clone())
}

pub fn plan_by_position(page: &SkillPage, request: &ResolveRequest) -> Option<ElementRef> {
    let n = request.code.number()?.checked_sub(1)? as usize;
    plan_section(page, request)?
        .rows
        .get(n)
        .map(|r| r.handle.clone())
}

pub fn category_by_number(page: &SkillPage, request: &ResolveRequest) -> Option<ElementRef> {
    let number = request.code.number()?;
    category_section(page, request)?
        .rows
        .iter()
        .find(|r| r.number.as_deref().and_then(marker_number) == Some(number))
        .map(|r| r.handle.clone())
}

pub fn category_by_name(page: &SkillPage, request: &ResolveRequest) -> Option<ElementRef> {
    category_section(page, request)?
        .rows
        .iter()
        .find(|r| name_equals(r, request))
        .map(|r| r.handle.clone())
}

/// Containment match over every row on the page.
pub fn global_by_name(page: &SkillPage, request: &ResolveRequest) -> Option<ElementRef> {
    let needle = normalize(&request.name);
    if needle.is_empty() {
        return None;
    }
    page.rows
        .iter()
        .find(|r| normalize(&r.name).contains(&needle))
        .map(|r| r.handle.clone())
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
