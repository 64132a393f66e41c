//! Reading a comparable textual value out of a live element

use crate::patterns::{RangeValuePattern, SelectionPattern, TextPattern, TogglePattern, ValuePattern};
use crate::UIElement;
use tracing::debug;

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Render a range value. Integral values keep one decimal place (`57.0`);
/// everything else uses the shortest form that reads back to the same number.
pub fn format_range_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Extract the current value of `element`.
///
/// Patterns are queried in order (value, text, range value, selection, toggle)
/// and the first non-empty answer wins; the display name is the last resort.
/// Unsupported or failing queries are skipped. Returns `""` when nothing yields
/// a value.
pub fn extract_value(element: &UIElement) -> String {
    if let Some(value) = element.pattern::<ValuePattern>().and_then(|p| non_empty(p.value)) {
        return value;
    }

    if let Some(text) = element
        .pattern::<TextPattern>()
        .and_then(|p| non_empty(p.document_text))
    {
        return text;
    }

    if let Some(range) = element.pattern::<RangeValuePattern>() {
        return format_range_value(range.value);
    }

    if let Some(selection) = element.pattern::<SelectionPattern>() {
        let names: Vec<String> = selection
            .selected_names
            .into_iter()
            .filter(|name| !name.is_empty())
            .collect();
        if !names.is_empty() {
            return names.join(", ");
        }
    }

    if let Some(toggle) = element.pattern::<TogglePattern>() {
        return toggle.state.code().to_string();
    }

    match element.name() {
        Ok(name) => name,
        Err(e) => {
            debug!("No value source available: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_range_value() {
        assert_eq!(format_range_value(57.0), "57.0");
        assert_eq!(format_range_value(12.5), "12.5");
        assert_eq!(format_range_value(-3.0), "-3.0");
        assert_eq!(format_range_value(0.1), "0.1");
        assert_eq!(format_range_value(f64::INFINITY), "inf");
    }
}
