use std::collections::BTreeMap;

use super::controls::{SelectControl, SelectOption};

/// Placeholder shown when the parent value maps to no options.
pub const NO_OPTIONS_PLACEHOLDER: &str = "No locations available";

/// Replace the option set of a dependent dropdown for `parent_value`.
///
/// An empty (or missing) mapping leaves a disabled control holding a single
/// disabled placeholder. Otherwise the control is enabled with a placeholder
/// followed by the mapped options, and `saved` is selected if listed.
/// Repeated calls with the same arguments produce the same control.
pub fn populate_dependent_select(
    control: &mut SelectControl,
    placeholder: &str,
    options_map: &BTreeMap<String, Vec<String>>,
    parent_value: &str,
    saved: Option<&str>,
) {
    let mapped = options_map
        .get(parent_value)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if mapped.is_empty() {
        *control = SelectControl {
            options: vec![SelectOption::placeholder(NO_OPTIONS_PLACEHOLDER)],
            selected: Some(0),
            enabled: false,
        };
        return;
    }

    *control = SelectControl::with_choices(placeholder, mapped, saved);
}
