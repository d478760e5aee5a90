//! Read-only capture of a skill page.

use std::collections::HashMap;

use skillstar_config::LayoutConfig;
use tracing::debug;

use crate::error::TreeError;
use crate::tree::{DocumentTree, ElementRef, NodeSnapshot, Query};

/// One skill row as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillRow {
    pub handle: ElementRef,
    /// Text of the row's name element.
    pub name: String,
    /// Text of the row's structural number marker, if it has one.
    pub number: Option<String>,
    /// Value of the configured id attribute.
    pub external_id: Option<String>,
}

/// A category container or plan section with its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub handle: ElementRef,
    pub header: String,
    /// Rows inside this section, in document order.
    pub rows: Vec<SkillRow>,
}

/// Everything the locator strategies look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillPage {
    pub sections: Vec<Section>,
    /// Every skill row on the page, in document order.
    pub rows: Vec<SkillRow>,
}

impl SkillPage {
    /// Capture the current page. Reads only.
    ///
    /// `plan_based` selects plan sections instead of category containers.
    pub async fn capture(
        tree: &dyn DocumentTree,
        layout: &LayoutConfig,
        plan_based: bool,
    ) -> Result<Self, TreeError> {
        let (container, header) = if plan_based {
            (&layout.plan_section, &layout.plan_section_header)
        } else {
            (&layout.category_container, &layout.category_header)
        };

        let mut rows = Vec::new();
        for node in tree.find(&Query::all(&layout.skill_row)).await? {
            rows.push(read_row(tree, layout, node).await?);
        }
        let index: HashMap<&ElementRef, usize> =
            rows.iter().enumerate().map(|(i, r)| (&r.handle, i)).collect();

        let mut sections = Vec::new();
        for node in tree.find(&Query::all(container)).await? {
            let header_text = first_text(tree, &node.handle, header).await?.unwrap_or_default();
            let members = tree
                .find(&Query::within(&node.handle, &layout.skill_row))
                .await?
                .iter()
                .filter_map(|m| index.get(&m.handle).map(|&i| rows[i].clone()))
                .collect();

            sections.push(Section {
                handle: node.handle,
                header: header_text,
                rows: members,
            });
        }

        debug!(
            sections = sections.len(),
            rows = rows.len(),
            plan_based,
            "Captured skill page"
        );
        Ok(Self { sections, rows })
    }
}

async fn read_row(
    tree: &dyn DocumentTree,
    layout: &LayoutConfig,
    node: NodeSnapshot,
) -> Result<SkillRow, TreeError> {
    let name = first_text(tree, &node.handle, &layout.skill_name)
        .await?
        .unwrap_or_else(|| node.text.clone());
    let number = first_text(tree, &node.handle, &layout.skill_number).await?;
    let external_id = node.attr(&layout.skill_id_attribute).map(str::to_string);

    Ok(SkillRow {
        handle: node.handle,
        name,
        number,
        external_id,
    })
}

async fn first_text(
    tree: &dyn DocumentTree,
    scope: &ElementRef,
    selector: &str,
) -> Result<Option<String>, TreeError> {
    Ok(tree
        .find(&Query::within(scope, selector))
        .await?
        .into_iter()
        .next()
        .map(|n| n.text))
}
