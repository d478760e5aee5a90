//! Scriptable in-memory document tree for tests.
//!
//! Answers queries for the default [`LayoutConfig`] selectors only. Handles
//! are plain strings (`skill:3`, `mrow:1/toggle`) and every call is logged.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use skillstar_browser::WaitUntil;
use skillstar_config::LayoutConfig;

use crate::error::TreeError;
use crate::tree::{DocumentTree, ElementRef, NodeSnapshot, Query};

/// How a menu row renders its "on" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Class,
    AriaPressed,
    RowClass,
    NestedMarker,
    DataAttr,
}

#[derive(Debug, Clone)]
pub struct FakeMenuRow {
    pub label: String,
    /// `None`: the row has no star control.
    pub signal: Option<Signal>,
    pub on: bool,
}

impl FakeMenuRow {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            signal: Some(Signal::Class),
            on: false,
        }
    }

    pub fn on(mut self) -> Self {
        self.on = true;
        self
    }

    pub fn signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn without_toggle(mut self) -> Self {
        self.signal = None;
        self
    }
}

/// How the suggestion menu reacts to hovering the icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuMode {
    Hover,
    DispatchedHover,
    Never,
}

#[derive(Debug, Clone)]
pub struct FakeSkill {
    pub name: String,
    pub number: Option<String>,
    pub external_id: Option<String>,
    pub has_icon: bool,
    pub menu_mode: MenuMode,
    pub menu: Vec<FakeMenuRow>,
}

impl FakeSkill {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            number: None,
            external_id: None,
            has_icon: true,
            menu_mode: MenuMode::Hover,
            menu: Vec::new(),
        }
    }

    pub fn number(mut self, number: &str) -> Self {
        self.number = Some(number.to_string());
        self
    }

    pub fn external_id(mut self, id: &str) -> Self {
        self.external_id = Some(id.to_string());
        self
    }

    pub fn without_icon(mut self) -> Self {
        self.has_icon = false;
        self
    }

    pub fn menu_mode(mut self, mode: MenuMode) -> Self {
        self.menu_mode = mode;
        self
    }

    pub fn menu(mut self, rows: Vec<FakeMenuRow>) -> Self {
        self.menu = rows;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FakeSection {
    pub header: String,
    pub skills: Vec<FakeSkill>,
}

impl FakeSection {
    pub fn new(header: &str, skills: Vec<FakeSkill>) -> Self {
        Self {
            header: header.to_string(),
            skills,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub plan_based: bool,
    pub sections: Vec<FakeSection>,
    /// Rows outside any section, rendered after them.
    pub loose: Vec<FakeSkill>,
}

impl FakePage {
    pub fn category(sections: Vec<FakeSection>) -> Self {
        Self {
            plan_based: false,
            sections,
            loose: Vec::new(),
        }
    }

    pub fn plan(sections: Vec<FakeSection>) -> Self {
        Self {
            plan_based: true,
            sections,
            loose: Vec::new(),
        }
    }

    fn skill_count(&self) -> usize {
        self.sections.iter().map(|s| s.skills.len()).sum::<usize>() + self.loose.len()
    }

    /// Global index range of section `j`.
    fn section_range(&self, j: usize) -> std::ops::Range<usize> {
        let start: usize = self.sections[..j].iter().map(|s| s.skills.len()).sum();
        start..start + self.sections[j].skills.len()
    }

    fn skill(&self, i: usize) -> Option<&FakeSkill> {
        self.sections
            .iter()
            .flat_map(|s| s.skills.iter())
            .chain(self.loose.iter())
            .nth(i)
    }

    fn skill_mut(&mut self, i: usize) -> Option<&mut FakeSkill> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.skills.iter_mut())
            .chain(self.loose.iter_mut())
            .nth(i)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Navigate(String),
    Find(String),
    Inspect(String),
    Hover(String),
    DispatchHover(String),
    Click(String),
    ScrollIntoView(String),
    ScrollBy(String),
    PressKey(String),
    WaitForVisible(String),
    WaitForTimeout,
}

struct FakeState {
    page: FakePage,
    open_menu: Option<usize>,
    scroll_offset: usize,
    calls: Vec<Call>,
}

pub struct FakeTree {
    layout: LayoutConfig,
    /// Menu rows rendered at once.
    window: usize,
    /// Pixels per menu row when scrolling.
    row_height: f64,
    fail_navigation: bool,
    fail_close: bool,
    state: Mutex<FakeState>,
}

impl FakeTree {
    pub fn new(page: FakePage) -> Self {
        Self {
            layout: LayoutConfig::default(),
            window: 8,
            row_height: 40.0,
            fail_navigation: false,
            fail_close: false,
            state: Mutex::new(FakeState {
                page,
                open_menu: None,
                scroll_offset: 0,
                calls: Vec::new(),
            }),
        }
    }

    pub fn with_window(mut self, rows: usize) -> Self {
        self.window = rows;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Click(h) => Some(h),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|&c| pred(c)).count()
    }

    /// Current star state of `label` in the menu of skill `i`.
    pub fn is_on(&self, skill: usize, label: &str) -> bool {
        let state = self.state.lock();
        state
            .page
            .skill(skill)
            .and_then(|s| s.menu.iter().find(|r| r.label == label))
            .is_some_and(|r| r.on)
    }

    pub fn menu_open(&self) -> bool {
        self.state.lock().open_menu.is_some()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    fn skill_node(i: usize, skill: &FakeSkill, layout: &LayoutConfig) -> NodeSnapshot {
        let mut node = NodeSnapshot::new(ElementRef::new(format!("skill:{}", i)), "li")
            .with_class("skill-tree-skill-node")
            .with_text(&skill.name);
        if let Some(id) = &skill.external_id {
            node = node.with_attr(&layout.skill_id_attribute, id);
        }
        node
    }

    fn menu_row_node(k: usize, row: &FakeMenuRow) -> NodeSnapshot {
        let mut node = NodeSnapshot::new(ElementRef::new(format!("mrow:{}", k)), "li")
            .with_class("suggestion-menu-row")
            .with_text(&row.label);
        if row.on && row.signal == Some(Signal::RowClass) {
            node = node.with_class("selected");
        }
        node
    }

    fn toggle_node(k: usize, row: &FakeMenuRow) -> NodeSnapshot {
        let mut node = NodeSnapshot::new(ElementRef::new(format!("mrow:{}/toggle", k)), "button")
            .with_class("suggestion-star");
        match row.signal {
            Some(Signal::Class) if row.on => node = node.with_class("active"),
            Some(Signal::AriaPressed) => {
                node = node.with_attr("aria-pressed", if row.on { "true" } else { "false" })
            }
            Some(Signal::NestedMarker) => {
                let class = if row.on { "star-filled" } else { "star-empty" };
                node = node.with_child(NodeSnapshot::new(ElementRef::new(""), "i").with_class(class));
            }
            Some(Signal::DataAttr) if row.on => node = node.with_attr("data-suggested", "true"),
            _ => {}
        }
        node
    }

    fn parse_index(handle: &str, prefix: &str) -> Option<usize> {
        handle.strip_prefix(prefix)?.split('/').next()?.parse().ok()
    }

    fn open(state: &mut FakeState, icon: &ElementRef, modes: &[MenuMode]) {
        let Some(i) = Self::parse_index(icon.selector(), "skill:") else {
            return;
        };
        if state.page.skill(i).is_some_and(|s| modes.contains(&s.menu_mode)) {
            state.open_menu = Some(i);
            state.scroll_offset = 0;
        }
    }
}

#[async_trait]
impl DocumentTree for FakeTree {
    async fn navigate(&self, url: &str, _wait: WaitUntil) -> Result<(), TreeError> {
        self.record(Call::Navigate(url.to_string()));
        if self.fail_navigation {
            return Err(TreeError::ElementNotFound(format!("navigation to {} failed", url)));
        }
        let mut state = self.state.lock();
        state.open_menu = None;
        state.scroll_offset = 0;
        Ok(())
    }

    async fn find(&self, query: &Query) -> Result<Vec<NodeSnapshot>, TreeError> {
        self.record(Call::Find(query.selector.clone()));
        let layout = &self.layout;
        let state = self.state.lock();
        let page = &state.page;
        let sel = query.selector.as_str();

        let Some(scope) = &query.scope else {
            let container = if page.plan_based {
                &layout.plan_section
            } else {
                &layout.category_container
            };

            if sel == layout.skill_row {
                return Ok((0..page.skill_count())
                    .filter_map(|i| page.skill(i).map(|s| Self::skill_node(i, s, layout)))
                    .collect());
            }
            if sel == *container {
                return Ok((0..page.sections.len())
                    .map(|j| {
                        NodeSnapshot::new(ElementRef::new(format!("section:{}", j)), "section")
                            .with_text(&page.sections[j].header)
                    })
                    .collect());
            }
            if let Some(open) = state.open_menu {
                let rows = page.skill(open).map(|s| s.menu.as_slice()).unwrap_or(&[]);
                if sel == layout.menu_row {
                    let end = (state.scroll_offset + self.window).min(rows.len());
                    let start = state.scroll_offset.min(end);
                    return Ok((start..end)
                        .map(|k| Self::menu_row_node(k, &rows[k]))
                        .collect());
                }
                if sel == layout.menu_list {
                    return Ok(vec![NodeSnapshot::new(ElementRef::new("menu/list"), "ul")]);
                }
            }
            return Ok(Vec::new());
        };

        let handle = scope.selector();
        if let Some(j) = Self::parse_index(handle, "section:") {
            if j >= page.sections.len() {
                return Err(TreeError::ElementNotFound(handle.to_string()));
            }
            let header = if page.plan_based {
                &layout.plan_section_header
            } else {
                &layout.category_header
            };
            if sel == layout.skill_row {
                return Ok(page
                    .section_range(j)
                    .filter_map(|i| page.skill(i).map(|s| Self::skill_node(i, s, layout)))
                    .collect());
            }
            if sel == *header {
                return Ok(vec![
                    NodeSnapshot::new(ElementRef::new(format!("{}/header", handle)), "h2")
                        .with_text(&page.sections[j].header),
                ]);
            }
            return Ok(Vec::new());
        }

        if let Some(i) = Self::parse_index(handle, "skill:") {
            let skill = page
                .skill(i)
                .ok_or_else(|| TreeError::ElementNotFound(handle.to_string()))?;
            let node = |suffix: &str, text: &str| {
                NodeSnapshot::new(ElementRef::new(format!("skill:{}/{}", i, suffix)), "span")
                    .with_text(text)
            };
            if sel == layout.skill_name {
                return Ok(vec![node("name", &skill.name)]);
            }
            if sel == layout.skill_number {
                return Ok(skill.number.iter().map(|n| node("number", n.as_str())).collect());
            }
            if sel == layout.suggestion_icon && skill.has_icon {
                return Ok(vec![node("icon", "")]);
            }
            return Ok(Vec::new());
        }

        if let Some(k) = Self::parse_index(handle, "mrow:") {
            let row = state
                .open_menu
                .and_then(|open| page.skill(open))
                .and_then(|s| s.menu.get(k))
                .ok_or_else(|| TreeError::ElementNotFound(handle.to_string()))?;
            if sel == layout.row_label {
                return Ok(vec![
                    NodeSnapshot::new(ElementRef::new(format!("mrow:{}/label", k)), "span")
                        .with_text(&row.label),
                ]);
            }
            if sel == layout.toggle && row.signal.is_some() {
                return Ok(vec![Self::toggle_node(k, row)]);
            }
            return Ok(Vec::new());
        }

        Ok(Vec::new())
    }

    async fn inspect(&self, element: &ElementRef) -> Result<NodeSnapshot, TreeError> {
        self.record(Call::Inspect(element.to_string()));
        let state = self.state.lock();
        let handle = element.selector();

        let row = Self::parse_index(handle, "mrow:").and_then(|k| {
            state
                .open_menu
                .and_then(|open| state.page.skill(open))
                .and_then(|s| s.menu.get(k))
                .map(|row| (k, row))
        });
        match row {
            Some((k, row)) if handle.ends_with("/toggle") => Ok(Self::toggle_node(k, row)),
            Some((k, row)) => Ok(Self::menu_row_node(k, row)),
            None => Err(TreeError::ElementNotFound(handle.to_string())),
        }
    }

    async fn hover(&self, element: &ElementRef) -> Result<(), TreeError> {
        self.record(Call::Hover(element.to_string()));
        Self::open(&mut self.state.lock(), element, &[MenuMode::Hover]);
        Ok(())
    }

    async fn dispatch_hover(&self, element: &ElementRef) -> Result<(), TreeError> {
        self.record(Call::DispatchHover(element.to_string()));
        Self::open(
            &mut self.state.lock(),
            element,
            &[MenuMode::Hover, MenuMode::DispatchedHover],
        );
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), TreeError> {
        self.record(Call::Click(element.to_string()));
        let mut state = self.state.lock();
        let handle = element.selector();

        if let (Some(k), Some(open)) = (Self::parse_index(handle, "mrow:"), state.open_menu) {
            if let Some(row) = state.page.skill_mut(open).and_then(|s| s.menu.get_mut(k)) {
                row.on = !row.on;
            }
        }
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), TreeError> {
        self.record(Call::ScrollIntoView(element.to_string()));
        Ok(())
    }

    async fn scroll_by(&self, element: &ElementRef, delta_y: f64) -> Result<(), TreeError> {
        self.record(Call::ScrollBy(element.to_string()));
        let mut state = self.state.lock();
        let Some(open) = state.open_menu else {
            return Err(TreeError::ElementNotFound(element.to_string()));
        };
        let len = state.page.skill(open).map(|s| s.menu.len()).unwrap_or(0);
        let step = (delta_y / self.row_height).floor().max(0.0) as usize;
        state.scroll_offset = (state.scroll_offset + step).min(len);
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), TreeError> {
        self.record(Call::PressKey(key.to_string()));
        if self.fail_close {
            return Err(TreeError::ElementNotFound("keyboard target".to_string()));
        }
        if key == "Escape" {
            self.state.lock().open_menu = None;
        }
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, _timeout: Duration) -> Result<bool, TreeError> {
        self.record(Call::WaitForVisible(selector.to_string()));
        let state = self.state.lock();
        if selector == self.layout.menu_marker {
            return Ok(state.open_menu.is_some());
        }
        if selector == self.layout.skill_row {
            return Ok(state.page.skill_count() > 0);
        }
        Ok(false)
    }

    async fn wait_for_timeout(&self, _duration: Duration) {
        self.record(Call::WaitForTimeout);
    }
}
