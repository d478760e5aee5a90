//! Suggestion toggle state.
//!
//! The platform marks an "on" star in several unrelated ways depending on
//! the skill type, so the state is a plain OR over every known signal.

use crate::tree::NodeSnapshot;

/// Classes that mark the toggle control itself as active.
const ACTIVE_CLASSES: &[&str] = &["active", "on", "checked", "suggested", "starred"];

/// Classes that mark the whole menu row as selected.
const ROW_SELECTED_CLASSES: &[&str] = &["selected", "suggested"];

/// Classes on a nested icon that render the star filled.
const NESTED_MARKER_CLASSES: &[&str] = &["filled", "active", "on"];

/// Data attributes that carry the state as `"true"`.
const DATA_FLAGS: &[&str] = &["data-selected", "data-suggested"];

/// Whether the star in `row` is currently on.
///
/// `row` is the menu row and `toggle` the control inside it; `toggle` should
/// be inspected with its subtree so nested markers are visible.
pub fn is_toggled_on(row: &NodeSnapshot, toggle: &NodeSnapshot) -> bool {
    has_active_class(toggle)
        || is_aria_pressed(toggle)
        || is_row_selected(row)
        || has_nested_marker(toggle)
        || has_data_flag(toggle)
        || has_data_flag(row)
}

/// `active`, `is-active`, `star-active` all count.
fn class_matches(class: &str, words: &[&str]) -> bool {
    let class = class.to_ascii_lowercase();
    words.iter().any(|w| {
        class == *w
            || class
                .strip_suffix(w)
                .is_some_and(|head| head.ends_with('-') || head.ends_with('_'))
    })
}

fn has_active_class(toggle: &NodeSnapshot) -> bool {
    toggle.classes.iter().any(|c| class_matches(c, ACTIVE_CLASSES))
}

fn is_aria_pressed(toggle: &NodeSnapshot) -> bool {
    toggle
        .attr("aria-pressed")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn is_row_selected(row: &NodeSnapshot) -> bool {
    row.classes.iter().any(|c| class_matches(c, ROW_SELECTED_CLASSES))
}

fn has_nested_marker(toggle: &NodeSnapshot) -> bool {
    toggle
        .descendants()
        .iter()
        .any(|n| n.classes.iter().any(|c| class_matches(c, NESTED_MARKER_CLASSES)))
}

fn has_data_flag(node: &NodeSnapshot) -> bool {
    DATA_FLAGS
        .iter()
        .any(|name| node.attr(name).is_some_and(|v| v.eq_ignore_ascii_case("true")))
}
