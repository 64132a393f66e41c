//! Derivation of a comparable value from raw extracted text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::errors::AutomationError;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+\.?\d*").unwrap());
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+").unwrap());
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+\.\d+").unwrap());

/// How the raw extracted value is turned into the value that gets compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    #[default]
    #[serde(alias = "原始值")]
    Raw,
    #[serde(alias = "提取数字")]
    ExtractNumber,
    #[serde(alias = "提取整数")]
    ExtractInteger,
    #[serde(alias = "提取小数")]
    ExtractDecimal,
    #[serde(alias = "去除空格")]
    StripWhitespace,
    #[serde(alias = "取长度")]
    Length,
}

impl ExtractionMode {
    pub const ALL: [ExtractionMode; 6] = [
        ExtractionMode::Raw,
        ExtractionMode::ExtractNumber,
        ExtractionMode::ExtractInteger,
        ExtractionMode::ExtractDecimal,
        ExtractionMode::StripWhitespace,
        ExtractionMode::Length,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMode::Raw => "raw",
            ExtractionMode::ExtractNumber => "extract_number",
            ExtractionMode::ExtractInteger => "extract_integer",
            ExtractionMode::ExtractDecimal => "extract_decimal",
            ExtractionMode::StripWhitespace => "strip_whitespace",
            ExtractionMode::Length => "length",
        }
    }

    /// Label used by watch lists written with localized mode names.
    pub fn localized_label(self) -> &'static str {
        match self {
            ExtractionMode::Raw => "原始值",
            ExtractionMode::ExtractNumber => "提取数字",
            ExtractionMode::ExtractInteger => "提取整数",
            ExtractionMode::ExtractDecimal => "提取小数",
            ExtractionMode::StripWhitespace => "去除空格",
            ExtractionMode::Length => "取长度",
        }
    }

    pub fn apply(self, raw: Option<&str>) -> String {
        transform(raw, self)
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s) || mode.localized_label() == s)
            .ok_or_else(|| AutomationError::InvalidArgument(format!("Unknown extraction mode: {s}")))
    }
}

fn first_match(re: &Regex, haystack: &str) -> Option<String> {
    re.find(haystack).map(|m| m.as_str().to_string())
}

/// Apply `mode` to a raw value. A missing raw value is treated as the empty string.
pub fn transform(raw: Option<&str>, mode: ExtractionMode) -> String {
    let raw = raw.unwrap_or_default();
    match mode {
        ExtractionMode::Raw => raw.to_string(),
        ExtractionMode::ExtractNumber => first_match(&NUMBER, raw).unwrap_or_default(),
        ExtractionMode::ExtractInteger => first_match(&INTEGER, raw).unwrap_or_default(),
        ExtractionMode::ExtractDecimal => first_match(&DECIMAL, raw)
            .or_else(|| first_match(&INTEGER, raw))
            .unwrap_or_default(),
        ExtractionMode::StripWhitespace => raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '\t' | '\n'))
            .collect(),
        ExtractionMode::Length => raw.chars().count().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_number_without_digits_is_empty() {
        assert_eq!(transform(Some("abc"), ExtractionMode::ExtractNumber), "");
        assert_eq!(transform(Some(""), ExtractionMode::ExtractNumber), "");
        assert_eq!(transform(None, ExtractionMode::ExtractNumber), "");
    }

    #[test]
    fn test_extract_number_takes_first_match() {
        assert_eq!(
            transform(Some("Total: -12.50 USD (3 items)"), ExtractionMode::ExtractNumber),
            "-12.50"
        );
        assert_eq!(transform(Some("v2."), ExtractionMode::ExtractNumber), "2.");
    }

    #[test]
    fn test_extract_integer() {
        assert_eq!(transform(Some("Progress: 57%"), ExtractionMode::ExtractInteger), "57");
        assert_eq!(transform(Some("3.99"), ExtractionMode::ExtractInteger), "3");
    }

    #[test]
    fn test_extract_decimal_falls_back_to_integer() {
        assert_eq!(transform(Some("7 of 1.25"), ExtractionMode::ExtractDecimal), "1.25");
        assert_eq!(transform(Some("7 of 8"), ExtractionMode::ExtractDecimal), "7");
        assert_eq!(transform(Some("none"), ExtractionMode::ExtractDecimal), "");
    }

    #[test]
    fn test_strip_whitespace_keeps_other_characters() {
        assert_eq!(
            transform(Some(" a b\tc\nd\r"), ExtractionMode::StripWhitespace),
            "abcd\r"
        );
    }

    #[test]
    fn test_length_counts_characters() {
        assert_eq!(transform(Some("hello world"), ExtractionMode::Length), "11");
        assert_eq!(transform(Some("温度"), ExtractionMode::Length), "2");
        assert_eq!(transform(None, ExtractionMode::Length), "0");
    }

    #[test]
    fn test_raw_is_identity() {
        assert_eq!(transform(Some(" 42 "), ExtractionMode::Raw), " 42 ");
        assert_eq!(transform(None, ExtractionMode::Raw), "");
    }

    #[test]
    fn test_mode_names_and_aliases() {
        let mode: ExtractionMode = serde_json::from_str("\"extract_integer\"").unwrap();
        assert_eq!(mode, ExtractionMode::ExtractInteger);
        let mode: ExtractionMode = serde_json::from_str("\"取长度\"").unwrap();
        assert_eq!(mode, ExtractionMode::Length);
        assert_eq!(
            serde_json::to_string(&ExtractionMode::StripWhitespace).unwrap(),
            "\"strip_whitespace\""
        );
        assert_eq!("提取小数".parse::<ExtractionMode>().unwrap(), ExtractionMode::ExtractDecimal);
        assert_eq!("RAW".parse::<ExtractionMode>().unwrap(), ExtractionMode::Raw);
        assert!("sum".parse::<ExtractionMode>().is_err());
    }
}
