//! Comparison of a derived value against a target

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AutomationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(alias = "包含")]
    Contains,
    #[serde(alias = "不包含")]
    NotContains,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::Equal,
        Operator::GreaterOrEqual,
        Operator::LessOrEqual,
        Operator::NotEqual,
        Operator::Contains,
        Operator::NotContains,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::Equal => "=",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::NotEqual => "!=",
            Operator::Contains => "Contains",
            Operator::NotContains => "NotContains",
        }
    }

    fn localized_label(self) -> Option<&'static str> {
        match self {
            Operator::Contains => Some("包含"),
            Operator::NotContains => Some("不包含"),
            _ => None,
        }
    }

    fn compare_numbers(self, current: f64, target: f64) -> Option<bool> {
        match self {
            Operator::GreaterThan => Some(current > target),
            Operator::LessThan => Some(current < target),
            Operator::Equal => Some(current == target),
            Operator::GreaterOrEqual => Some(current >= target),
            Operator::LessOrEqual => Some(current <= target),
            Operator::NotEqual => Some(current != target),
            Operator::Contains | Operator::NotContains => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.symbol() == s || op.localized_label() == Some(s))
            .ok_or_else(|| AutomationError::InvalidArgument(format!("Unknown operator: {s}")))
    }
}

/// First code point of each Unicode decimal digit run that values can carry.
const DIGIT_ZEROS: [u32; 22] = [
    0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66, 0x0CE6,
    0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946, 0xFF10,
];

fn ascii_digit(c: char) -> Option<char> {
    let code = c as u32;
    DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&code))
        .and_then(|&zero| char::from_digit(code - zero, 10))
}

/// Numeric reading of a value. The empty string reads as zero.
///
/// Decimal digits from any script read as their ASCII counterparts, so `"５７"` is 57.
fn as_number(value: &str) -> Option<f64> {
    if value.is_empty() {
        return Some(0.0);
    }
    let trimmed = value.trim();
    if trimmed.is_ascii() {
        return trimmed.parse::<f64>().ok();
    }
    let normalized: String = trimmed
        .chars()
        .map(|c| ascii_digit(c).unwrap_or(c))
        .collect();
    normalized.parse::<f64>().ok()
}

/// Decide whether `current` satisfies `operator` against `target`.
///
/// Ordering and equality operators compare numerically when both sides parse as
/// numbers. Everything else falls back to string comparison, where only `=`, `!=`
/// and the substring operators are defined; other operators yield `false`.
pub fn evaluate(current: &str, operator: Operator, target: &str) -> bool {
    if let (Some(c), Some(t)) = (as_number(current), as_number(target)) {
        if let Some(result) = operator.compare_numbers(c, t) {
            return result;
        }
    }

    match operator {
        Operator::Equal => current == target,
        Operator::NotEqual => current != target,
        Operator::Contains => current.contains(target),
        Operator::NotContains => !current.contains(target),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_equality() {
        assert!(evaluate("42", Operator::Equal, "42.0"));
        assert!(!evaluate("42", Operator::NotEqual, "42.0"));
        assert!(evaluate(" 42 ", Operator::Equal, "42"));
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(evaluate("57", Operator::GreaterOrEqual, "50"));
        assert!(!evaluate("12", Operator::GreaterOrEqual, "50"));
        assert!(evaluate("-3.5", Operator::LessThan, "0"));
        assert!(evaluate("10", Operator::GreaterThan, "9"));
        assert!(evaluate("9", Operator::LessOrEqual, "9"));
    }

    #[test]
    fn test_non_ascii_digits_compare_numerically() {
        use crate::transform::{transform, ExtractionMode};

        let extracted = transform(Some("进度: ５７%"), ExtractionMode::ExtractInteger);
        assert_eq!(extracted, "５７");
        assert!(evaluate(&extracted, Operator::GreaterOrEqual, "50"));
        assert!(evaluate("٤٢", Operator::Equal, "42"));
        assert!(evaluate("१२.५", Operator::LessThan, "13"));
        assert!(!evaluate("５７", Operator::LessThan, "50"));
    }

    #[test]
    fn test_empty_reads_as_zero() {
        assert!(evaluate("", Operator::Equal, "0"));
        assert!(evaluate("", Operator::LessThan, "1"));
        assert!(evaluate("5", Operator::GreaterThan, ""));
    }

    #[test]
    fn test_string_fallback() {
        assert!(evaluate("ready", Operator::Equal, "ready"));
        assert!(evaluate("ready", Operator::NotEqual, "busy"));
        assert!(!evaluate("ready", Operator::GreaterThan, "busy"));
        assert!(!evaluate("abc", Operator::LessOrEqual, "5"));
    }

    #[test]
    fn test_contains() {
        assert!(evaluate("Error: disk full", Operator::Contains, "disk"));
        assert!(evaluate("ready", Operator::NotContains, "disk"));
        assert!(!evaluate("ready", Operator::Contains, "disk"));
        // Substring test applies even when both sides are numbers
        assert!(evaluate("1234", Operator::Contains, "23"));
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::GreaterOrEqual);
        assert_eq!("包含".parse::<Operator>().unwrap(), Operator::Contains);
        assert_eq!("NotContains".parse::<Operator>().unwrap(), Operator::NotContains);
        assert!("=>".parse::<Operator>().is_err());

        let op: Operator = serde_json::from_str("\"不包含\"").unwrap();
        assert_eq!(op, Operator::NotContains);
        assert_eq!(serde_json::to_string(&Operator::NotEqual).unwrap(), "\"!=\"");
    }
}
