//! The `monitors.json` watch list file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;
use uiwatch::{ExtractionMode, LocatorDescriptor, MonitorItem, Operator};

pub const DEFAULT_WATCH_LIST: &str = "monitors.json";

fn default_enabled() -> bool {
    true
}

fn default_interval() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// What was recorded about the element when it was picked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub automation_id: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub control_type: String,
    /// Value at pick time
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub runtime_id: Option<Vec<i64>>,
    #[serde(default)]
    pub bounding_rect: Option<BoundingRect>,
    #[serde(default)]
    pub process_id: u32,
    #[serde(default)]
    pub locator: LocatorDescriptor,
}

impl ElementInfo {
    pub fn from_locator(locator: LocatorDescriptor, value: impl Into<String>) -> Self {
        Self {
            name: locator.name().to_string(),
            automation_id: locator.automation_id().to_string(),
            class_name: locator.class_name().to_string(),
            control_type: locator.control_type().to_string(),
            value: value.into(),
            process_id: locator.process_id().unwrap_or(0),
            locator,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub element_info: ElementInfo,
    pub condition: String,
    #[serde(default)]
    pub target_value: String,
    #[serde(default)]
    pub extract_mode: String,
    #[serde(default)]
    pub sound_file: String,
    /// Seconds between checks as entered by the user. Polling uses the global interval.
    #[serde(default = "default_interval")]
    pub interval: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl WatchEntry {
    pub fn new(
        element_info: ElementInfo,
        operator: Operator,
        target_value: impl Into<String>,
        mode: ExtractionMode,
    ) -> Self {
        Self {
            element_info,
            condition: operator.symbol().to_string(),
            target_value: target_value.into(),
            extract_mode: mode.as_str().to_string(),
            sound_file: String::new(),
            interval: default_interval(),
            enabled: true,
        }
    }

    pub fn label(&self) -> &str {
        if !self.element_info.name.is_empty() {
            &self.element_info.name
        } else {
            &self.element_info.automation_id
        }
    }

    pub fn to_monitor_item(&self) -> Result<MonitorItem> {
        let operator: Operator = self.condition.parse()?;
        let mode = match self.extract_mode.trim() {
            "" => ExtractionMode::Raw,
            name => name.parse().unwrap_or_else(|e| {
                warn!("{}: {}, using raw values", self.label(), e);
                ExtractionMode::Raw
            }),
        };
        let mut item = MonitorItem::new(
            self.element_info.locator.clone(),
            operator,
            self.target_value.clone(),
        )
        .with_label(self.label())
        .with_extraction_mode(mode)
        .with_enabled(self.enabled);
        if !self.sound_file.is_empty() {
            item = item.with_sound_file(&self.sound_file);
        }
        Ok(item)
    }
}

/// Read a watch list. A missing file is an empty list.
pub fn load(path: &Path) -> Result<Vec<WatchEntry>> {
    if !path.exists() {
        tracing::debug!("No watch list at {}", path.display());
        return Ok(Vec::new());
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read watch list {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse watch list {}", path.display()))
}

pub fn save(path: &Path, entries: &[WatchEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, json).with_context(|| format!("Failed to write watch list {}", path.display()))
}

/// Convert entries to monitor items, keeping file order.
///
/// An entry that cannot be converted is logged and left out; the rest are kept.
pub fn to_monitor_items(entries: &[WatchEntry]) -> Vec<MonitorItem> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| match entry.to_monitor_item() {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping watch list entry {} ({}): {:#}", i, entry.label(), e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiwatch::PathSegment;

    const SAVED_BY_PICKER: &str = r##"[
  {
    "element_info": {
      "name": "Progress: 57%",
      "automation_id": "",
      "class_name": "Static",
      "control_type": "TextControl",
      "value": "Progress: 57%",
      "runtime_id": [42, 264, 7],
      "bounding_rect": {"left": 10, "top": 20, "right": 110, "bottom": 40},
      "process_id": 4242,
      "locator": {
        "automation_id": "",
        "name": "Progress: 57%",
        "class_name": "Static",
        "control_type": "TextControl",
        "process_id": 4242,
        "path": [
          {"name": "Desktop 1", "automation_id": "", "class_name": "#32769", "control_type": "PaneControl"},
          {"name": "Progress: 57%", "automation_id": "", "class_name": "Static", "control_type": "TextControl"}
        ]
      }
    },
    "condition": ">=",
    "target_value": "50",
    "extract_mode": "提取整数",
    "sound_file": "C:\\sounds\\12788.wav",
    "interval": 1.0,
    "enabled": true
  },
  {
    "element_info": {"automation_id": "txtLog", "locator": {"automation_id": "txtLog"}},
    "condition": "包含",
    "target_value": "error",
    "sound_file": "",
    "enabled": false
  }
]"##;

    fn write_list(json: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), json).unwrap();
        file
    }

    #[test]
    fn test_load_picker_file() {
        let file = write_list(SAVED_BY_PICKER);
        let entries = load(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].element_info.runtime_id, Some(vec![42, 264, 7]));
        assert_eq!(entries[0].element_info.locator.path().len(), 2);
        assert_eq!(entries[1].interval, 1.0);

        let items = to_monitor_items(&entries);
        assert_eq!(items[0].label, "Progress: 57%");
        assert_eq!(items[0].operator, Operator::GreaterOrEqual);
        assert_eq!(items[0].extraction_mode, ExtractionMode::ExtractInteger);
        assert!(items[0].sound_file.is_some());

        assert_eq!(items[1].label, "txtLog");
        assert_eq!(items[1].operator, Operator::Contains);
        assert_eq!(items[1].extraction_mode, ExtractionMode::Raw);
        assert!(!items[1].enabled);
        assert!(items[1].sound_file.is_none());
    }

    #[test]
    fn test_missing_file_is_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load(&dir.path().join("monitors.json")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_unknown_condition_skips_only_that_entry() {
        let file = write_list(
            r#"[
  {"element_info": {"name": "Total"}, "condition": "~=", "target_value": "1"},
  {"element_info": {"name": "Count"}, "condition": ">", "target_value": "3"},
  {"element_info": {"name": "Status"}, "condition": "=", "target_value": "OK", "extract_mode": "upper"}
]"#,
        );
        let entries = load(file.path()).unwrap();
        assert!(entries[0].to_monitor_item().is_err());

        let items = to_monitor_items(&entries);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "Count");
        assert_eq!(items[0].operator, Operator::GreaterThan);
        assert_eq!(items[1].label, "Status");
        assert_eq!(items[1].extraction_mode, ExtractionMode::Raw);
    }

    #[test]
    fn test_save_then_load_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitors.json");
        let locator = LocatorDescriptor::builder()
            .automation_id("txtAmount")
            .process_id(4242)
            .segment(PathSegment::new("Desktop 1", "", "#32769", "PaneControl"))
            .build();
        let entry = WatchEntry::new(
            ElementInfo::from_locator(locator, "1,250.75"),
            Operator::GreaterThan,
            "1000",
            ExtractionMode::ExtractDecimal,
        );

        save(&path, std::slice::from_ref(&entry)).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, vec![entry]);

        let item = loaded[0].to_monitor_item().unwrap();
        assert_eq!(item.label, "txtAmount");
        assert_eq!(item.extraction_mode, ExtractionMode::ExtractDecimal);
    }
}
