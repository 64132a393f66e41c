//! Accessibility pattern capabilities
//!
//! A UI element may or may not implement a given pattern, and availability is
//! inconsistent across applications. Platforms answer a single capability query
//! ([`crate::element::UIElementImpl::get_pattern`]) and callers use the typed
//! accessors on [`crate::UIElement`]:
//!
//! ```
//! # use uiwatch::UIElement;
//! # use uiwatch::patterns::ValuePattern;
//! # fn read(element: &UIElement) -> Option<String> {
//! element.pattern::<ValuePattern>().map(|p| p.value)
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pattern kinds queried by the value extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    Value,
    Text,
    RangeValue,
    Selection,
    Toggle,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternKind::Value => "ValuePattern",
            PatternKind::Text => "TextPattern",
            PatternKind::RangeValue => "RangeValuePattern",
            PatternKind::Selection => "SelectionPattern",
            PatternKind::Toggle => "TogglePattern",
        };
        f.write_str(name)
    }
}

/// Toggle state as reported by the toggle pattern.
///
/// The numeric codes match the UI Automation `ToggleState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToggleState {
    Off,
    On,
    Indeterminate,
}

impl ToggleState {
    pub fn code(self) -> i32 {
        match self {
            ToggleState::Off => 0,
            ToggleState::On => 1,
            ToggleState::Indeterminate => 2,
        }
    }
}

impl fmt::Display for ToggleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Raw answer of a platform to a pattern query.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternValue {
    Value(String),
    Text(String),
    RangeValue(f64),
    Selection(Vec<String>),
    Toggle(ToggleState),
}

impl PatternValue {
    pub fn kind(&self) -> PatternKind {
        match self {
            PatternValue::Value(_) => PatternKind::Value,
            PatternValue::Text(_) => PatternKind::Text,
            PatternValue::RangeValue(_) => PatternKind::RangeValue,
            PatternValue::Selection(_) => PatternKind::Selection,
            PatternValue::Toggle(_) => PatternKind::Toggle,
        }
    }
}

/// Typed view over a [`PatternValue`].
pub trait ElementPattern: Sized {
    const KIND: PatternKind;

    fn from_value(value: PatternValue) -> Option<Self>;
}

/// Value pattern (edit boxes and other value-bearing controls).
#[derive(Debug, Clone, PartialEq)]
pub struct ValuePattern {
    pub value: String,
}

/// Text pattern, holding the whole document range.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPattern {
    pub document_text: String,
}

/// Range value pattern (sliders, progress bars, spinners).
#[derive(Debug, Clone, PartialEq)]
pub struct RangeValuePattern {
    pub value: f64,
}

/// Selection pattern, holding the names of the currently selected items.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPattern {
    pub selected_names: Vec<String>,
}

/// Toggle pattern (check boxes, toggle buttons).
#[derive(Debug, Clone, PartialEq)]
pub struct TogglePattern {
    pub state: ToggleState,
}

impl ElementPattern for ValuePattern {
    const KIND: PatternKind = PatternKind::Value;

    fn from_value(value: PatternValue) -> Option<Self> {
        match value {
            PatternValue::Value(value) => Some(Self { value }),
            _ => None,
        }
    }
}

impl ElementPattern for TextPattern {
    const KIND: PatternKind = PatternKind::Text;

    fn from_value(value: PatternValue) -> Option<Self> {
        match value {
            PatternValue::Text(document_text) => Some(Self { document_text }),
            _ => None,
        }
    }
}

impl ElementPattern for RangeValuePattern {
    const KIND: PatternKind = PatternKind::RangeValue;

    fn from_value(value: PatternValue) -> Option<Self> {
        match value {
            PatternValue::RangeValue(value) => Some(Self { value }),
            _ => None,
        }
    }
}

impl ElementPattern for SelectionPattern {
    const KIND: PatternKind = PatternKind::Selection;

    fn from_value(value: PatternValue) -> Option<Self> {
        match value {
            PatternValue::Selection(selected_names) => Some(Self { selected_names }),
            _ => None,
        }
    }
}

impl ElementPattern for TogglePattern {
    const KIND: PatternKind = PatternKind::Toggle;

    fn from_value(value: PatternValue) -> Option<Self> {
        match value {
            PatternValue::Toggle(state) => Some(Self { state }),
            _ => None,
        }
    }
}

/// Serializable record of the patterns an element exposed when it was snapshotted.
///
/// `None` means the element did not support the pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle_state: Option<ToggleState>,
}

impl PatternSnapshot {
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.text.is_none()
            && self.range_value.is_none()
            && self.selection.is_none()
            && self.toggle_state.is_none()
    }

    pub fn get(&self, kind: PatternKind) -> Option<PatternValue> {
        match kind {
            PatternKind::Value => self.value.clone().map(PatternValue::Value),
            PatternKind::Text => self.text.clone().map(PatternValue::Text),
            PatternKind::RangeValue => self.range_value.map(PatternValue::RangeValue),
            PatternKind::Selection => self.selection.clone().map(PatternValue::Selection),
            PatternKind::Toggle => self.toggle_state.map(PatternValue::Toggle),
        }
    }

    pub fn set(&mut self, value: PatternValue) {
        match value {
            PatternValue::Value(v) => self.value = Some(v),
            PatternValue::Text(t) => self.text = Some(t),
            PatternValue::RangeValue(r) => self.range_value = Some(r),
            PatternValue::Selection(s) => self.selection = Some(s),
            PatternValue::Toggle(t) => self.toggle_state = Some(t),
        }
    }
}
