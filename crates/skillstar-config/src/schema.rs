//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub dropdown: DropdownConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Browser session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging port.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Run Chrome without a visible window.
    #[serde(default)]
    pub headless: bool,

    /// Persistent profile directory; keeps the platform login between runs.
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,

    /// Upper bound on waiting for Chrome to exit during teardown.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// Timeout for a single CDP request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long to wait for a freshly launched Chrome to expose its endpoint.
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout_ms: u64,
}

fn default_debug_port() -> u16 {
    9222
}

fn default_shutdown_grace() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_launch_timeout() -> u64 {
    6000
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: false,
            profile_dir: None,
            shutdown_grace_secs: default_shutdown_grace(),
            request_timeout_secs: default_request_timeout(),
            launch_timeout_ms: default_launch_timeout(),
        }
    }
}

impl BrowserConfig {
    /// Profile directory, falling back to `~/.skillstar/browser-profile`.
    pub fn profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".skillstar")
                .join("browser-profile")
        })
    }

    /// CDP HTTP endpoint.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }
}

/// Target platform routing and skill-plan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Platform root URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Skill tree page for grade-level subjects.
    /// Placeholders: `{base}`, `{subject}`, `{grade}`.
    #[serde(default = "default_category_url_template")]
    pub category_url_template: String,

    /// Skill plan page for section-keyed subjects.
    /// Placeholders: `{base}`, `{subject}`.
    #[serde(default = "default_plan_url_template")]
    pub plan_url_template: String,

    /// Subjects whose skills are organized by named plan sections.
    #[serde(default = "default_plan_subjects")]
    pub plan_subjects: Vec<String>,

    /// Skill code prefix -> section header label on plan pages.
    #[serde(default = "default_section_labels")]
    pub section_labels: HashMap<String, String>,

    /// External ids starting with one of these prefixes are never used for id lookup.
    #[serde(default = "default_excluded_id_prefixes")]
    pub excluded_id_prefixes: Vec<String>,

    /// How long to wait for skill rows to render after navigating.
    #[serde(default = "default_page_ready_timeout")]
    pub page_ready_timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://learning.example.com".to_string()
}

fn default_category_url_template() -> String {
    "{base}/{subject}/{grade}".to_string()
}

fn default_plan_url_template() -> String {
    "{base}/{subject}/skill-plans".to_string()
}

fn default_plan_subjects() -> Vec<String> {
    vec!["sat".to_string(), "act".to_string(), "state-test".to_string()]
}

fn default_section_labels() -> HashMap<String, String> {
    [
        ("R", "Reading"),
        ("W", "Writing"),
        ("M", "Math"),
        ("L", "Language"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_excluded_id_prefixes() -> Vec<String> {
    vec!["local-".to_string(), "plan-".to_string()]
}

fn default_page_ready_timeout() -> u64 {
    10_000
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            category_url_template: default_category_url_template(),
            plan_url_template: default_plan_url_template(),
            plan_subjects: default_plan_subjects(),
            section_labels: default_section_labels(),
            excluded_id_prefixes: default_excluded_id_prefixes(),
            page_ready_timeout_ms: default_page_ready_timeout(),
        }
    }
}

impl PlatformConfig {
    /// Whether skills of `subject` live on a section-keyed plan page.
    pub fn is_plan_subject(&self, subject: &str) -> bool {
        self.plan_subjects
            .iter()
            .any(|s| s.eq_ignore_ascii_case(subject))
    }

    /// Page URL for a grade-level skill tree.
    pub fn category_url(&self, subject: &str, grade: &str) -> String {
        self.category_url_template
            .replace("{base}", self.base_url.trim_end_matches('/'))
            .replace("{subject}", subject)
            .replace("{grade}", grade)
    }

    /// Page URL for a skill plan.
    pub fn plan_url(&self, subject: &str) -> String {
        self.plan_url_template
            .replace("{base}", self.base_url.trim_end_matches('/'))
            .replace("{subject}", subject)
    }

    /// Section header label for a plan skill code prefix.
    pub fn section_label(&self, prefix: &str) -> Option<&str> {
        self.section_labels
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(prefix))
            .map(|(_, v)| v.as_str())
    }

    /// Whether an external id may be used for id-based lookup.
    pub fn is_usable_external_id(&self, external_id: &str) -> bool {
        !external_id.trim().is_empty()
            && !self
                .excluded_id_prefixes
                .iter()
                .any(|p| external_id.starts_with(p.as_str()))
    }
}

/// CSS selectors describing the platform's rendered skill pages and menus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_category_container")]
    pub category_container: String,
    #[serde(default = "default_category_header")]
    pub category_header: String,
    #[serde(default = "default_plan_section")]
    pub plan_section: String,
    #[serde(default = "default_plan_section_header")]
    pub plan_section_header: String,
    #[serde(default = "default_skill_row")]
    pub skill_row: String,
    #[serde(default = "default_skill_number")]
    pub skill_number: String,
    #[serde(default = "default_skill_name")]
    pub skill_name: String,
    /// Attribute on a skill row carrying the platform's skill id.
    #[serde(default = "default_skill_id_attribute")]
    pub skill_id_attribute: String,
    #[serde(default = "default_suggestion_icon")]
    pub suggestion_icon: String,
    /// Becomes visible once the suggestion menu is open.
    #[serde(default = "default_menu_marker")]
    pub menu_marker: String,
    /// Scrollable container holding the menu rows.
    #[serde(default = "default_menu_list")]
    pub menu_list: String,
    #[serde(default = "default_menu_row")]
    pub menu_row: String,
    #[serde(default = "default_row_label")]
    pub row_label: String,
    #[serde(default = "default_toggle")]
    pub toggle: String,
}

fn default_category_container() -> String {
    ".skill-tree-category".to_string()
}

fn default_category_header() -> String {
    ".skill-tree-category-name".to_string()
}

fn default_plan_section() -> String {
    ".skill-plan-section".to_string()
}

fn default_plan_section_header() -> String {
    ".skill-plan-section-header".to_string()
}

fn default_skill_row() -> String {
    ".skill-tree-skill-node".to_string()
}

fn default_skill_number() -> String {
    ".skill-tree-skill-number".to_string()
}

fn default_skill_name() -> String {
    ".skill-tree-skill-name".to_string()
}

fn default_skill_id_attribute() -> String {
    "data-skill".to_string()
}

fn default_suggestion_icon() -> String {
    ".suggestion-icon".to_string()
}

fn default_menu_marker() -> String {
    ".suggestion-menu.open, .suggestion-modal".to_string()
}

fn default_menu_list() -> String {
    ".suggestion-menu-list".to_string()
}

fn default_menu_row() -> String {
    ".suggestion-menu-row".to_string()
}

fn default_row_label() -> String {
    ".suggestion-menu-row-name".to_string()
}

fn default_toggle() -> String {
    ".suggestion-star, button[aria-pressed]".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            category_container: default_category_container(),
            category_header: default_category_header(),
            plan_section: default_plan_section(),
            plan_section_header: default_plan_section_header(),
            skill_row: default_skill_row(),
            skill_number: default_skill_number(),
            skill_name: default_skill_name(),
            skill_id_attribute: default_skill_id_attribute(),
            suggestion_icon: default_suggestion_icon(),
            menu_marker: default_menu_marker(),
            menu_list: default_menu_list(),
            menu_row: default_menu_row(),
            row_label: default_row_label(),
            toggle: default_toggle(),
        }
    }
}

impl LayoutConfig {
    /// Selectors that must be non-empty, keyed by field name.
    pub fn required_selectors(&self) -> [(&'static str, &str); 12] {
        [
            ("category_container", &self.category_container),
            ("category_header", &self.category_header),
            ("plan_section", &self.plan_section),
            ("plan_section_header", &self.plan_section_header),
            ("skill_row", &self.skill_row),
            ("skill_name", &self.skill_name),
            ("suggestion_icon", &self.suggestion_icon),
            ("menu_marker", &self.menu_marker),
            ("menu_list", &self.menu_list),
            ("menu_row", &self.menu_row),
            ("row_label", &self.row_label),
            ("toggle", &self.toggle),
        ]
    }
}

/// Suggestion dropdown protocol tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropdownConfig {
    /// Wait for the menu marker after each hover attempt.
    #[serde(default = "default_open_wait")]
    pub open_wait_ms: u64,

    /// Upper bound on scroll-and-rescan passes over the menu.
    #[serde(default = "default_max_scroll_iterations")]
    pub max_scroll_iterations: u32,

    /// Pixels scrolled per pass.
    #[serde(default = "default_scroll_increment")]
    pub scroll_increment_px: u32,

    /// Pause after clicks and scrolls so virtualized rows re-render.
    #[serde(default = "default_settle")]
    pub settle_ms: u64,

    /// Key pressed to dismiss the menu.
    #[serde(default = "default_close_key")]
    pub close_key: String,
}

fn default_open_wait() -> u64 {
    1500
}

fn default_max_scroll_iterations() -> u32 {
    25
}

fn default_scroll_increment() -> u32 {
    240
}

fn default_settle() -> u64 {
    150
}

fn default_close_key() -> String {
    "Escape".to_string()
}

impl Default for DropdownConfig {
    fn default() -> Self {
        Self {
            open_wait_ms: default_open_wait(),
            max_scroll_iterations: default_max_scroll_iterations(),
            scroll_increment_px: default_scroll_increment(),
            settle_ms: default_settle(),
            close_key: default_close_key(),
        }
    }
}

/// Task queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// After an abort, the cancellation flag stays raised this long.
    #[serde(default = "default_abort_grace")]
    pub abort_grace_ms: u64,

    /// Maximum queued tasks (0 = unlimited).
    #[serde(default)]
    pub max_queue_size: usize,
}

fn default_abort_grace() -> u64 {
    2000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            abort_grace_ms: default_abort_grace(),
            max_queue_size: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Number of daily log files kept.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_max_files() -> usize {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
            max_files: default_max_files(),
        }
    }
}

impl LoggingConfig {
    /// Log directory, falling back to `~/.skillstar/logs`.
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".skillstar")
                .join("logs")
        })
    }
}
