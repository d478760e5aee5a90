//! Locator Resolver: maps a skill descriptor to its row on the current page.

mod snapshot;
mod strategy;

pub use snapshot::{Section, SkillPage, SkillRow};
pub use strategy::{LocatorChain, Resolution, ResolveRequest, Strategy, normalize};

use skillstar_config::{LayoutConfig, PlatformConfig};
use tracing::debug;

use crate::error::EngineError;
use crate::model::SkillDescriptor;
use crate::skill_code::SkillCode;
use crate::tree::{DocumentTree, ElementRef};

/// Resolves skills against the live page. Never mutates it.
pub struct Resolver {
    platform: PlatformConfig,
    layout: LayoutConfig,
    plan: LocatorChain,
    category: LocatorChain,
}

impl Resolver {
    pub fn new(platform: PlatformConfig, layout: LayoutConfig) -> Self {
        Self {
            platform,
            layout,
            plan: LocatorChain::plan(),
            category: LocatorChain::category(),
        }
    }

    /// Strategy input for `skill`; excluded external ids are dropped here.
    pub fn request(&self, skill: &SkillDescriptor) -> ResolveRequest {
        let code = SkillCode::parse(&skill.skill_code);
        let section_label = self
            .platform
            .section_label(code.prefix())
            .unwrap_or(code.prefix())
            .to_string();
        let external_id = skill
            .external_id
            .as_deref()
            .filter(|id| self.platform.is_usable_external_id(id))
            .map(str::to_string);

        ResolveRequest {
            code,
            name: skill.match_name().to_string(),
            display_name: skill.display_name.clone(),
            external_id,
            section_label: Some(section_label),
        }
    }

    /// Capture the page and resolve `skill` on it.
    pub async fn resolve(
        &self,
        tree: &dyn DocumentTree,
        skill: &SkillDescriptor,
        plan_based: bool,
    ) -> Result<ElementRef, EngineError> {
        let page = SkillPage::capture(tree, &self.layout, plan_based).await?;
        self.resolve_in(&page, skill, plan_based)
    }

    /// Resolve against an already captured page.
    pub fn resolve_in(
        &self,
        page: &SkillPage,
        skill: &SkillDescriptor,
        plan_based: bool,
    ) -> Result<ElementRef, EngineError> {
        let chain = if plan_based { &self.plan } else { &self.category };
        let request = self.request(skill);

        match chain.resolve(page, &request) {
            Some(resolution) => {
                debug!(
                    skill = %skill.skill_code,
                    strategy = resolution.strategy,
                    element = %resolution.element,
                    "Resolved skill"
                );
                Ok(resolution.element)
            }
            None => Err(EngineError::SkillNotFound(skill.skill_code.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(code: &str, external_id: Option<&str>) -> SkillDescriptor {
        SkillDescriptor {
            id: format!("sk-{}", code),
            skill_code: code.to_string(),
            external_id: external_id.map(str::to_string),
            display_name: "Main idea".to_string(),
            clean_name: String::new(),
            subject: "sat".to_string(),
            grade_level: "12".to_string(),
        }
    }

    fn resolver() -> Resolver {
        Resolver::new(PlatformConfig::default(), LayoutConfig::default())
    }

    #[test]
    fn test_request_drops_excluded_external_id() {
        let request = resolver().request(&skill("R.5", Some("plan-123")));
        assert_eq!(request.external_id, None);
        assert_eq!(request.section_label.as_deref(), Some("Reading"));
        assert_eq!(request.name, "Main idea");
    }

    #[test]
    fn test_request_keeps_usable_external_id() {
        let request = resolver().request(&skill("M.2", Some("ext-9")));
        assert_eq!(request.external_id.as_deref(), Some("ext-9"));
        assert_eq!(request.section_label.as_deref(), Some("Math"));
    }

    #[test]
    fn test_unmapped_prefix_uses_prefix_as_label() {
        let request = resolver().request(&skill("Q.1", None));
        assert_eq!(request.section_label.as_deref(), Some("Q"));
    }

    #[test]
    fn test_not_found_names_the_code() {
        let err = resolver()
            .resolve_in(&SkillPage::default(), &skill("R.5", None), true)
            .unwrap_err();
        assert!(matches!(err, EngineError::SkillNotFound(code) if code == "R.5"));
    }
}
