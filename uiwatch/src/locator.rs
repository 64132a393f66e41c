use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::selector::{ControlType, PropertyCondition};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default number of ancestors recorded when capturing a locator
pub const DEFAULT_CAPTURE_DEPTH: usize = 20;

/// One step of the structural route from the desktop root to an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub automation_id: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub control_type: String,
}

impl PathSegment {
    pub fn new(
        name: impl Into<String>,
        automation_id: impl Into<String>,
        class_name: impl Into<String>,
        control_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            automation_id: automation_id.into(),
            class_name: class_name.into(),
            control_type: control_type.into(),
        }
    }

    /// Read a segment from a live element. Unreadable properties are left empty.
    pub fn from_element(element: &UIElement) -> Self {
        Self {
            name: element.name().unwrap_or_default(),
            automation_id: element.automation_id().unwrap_or_default(),
            class_name: element.class_name().unwrap_or_default(),
            control_type: element.control_type().unwrap_or_default(),
        }
    }

    /// Strict match: every non-empty field of the segment must equal the element's value.
    pub fn matches_strictly(&self, element: &UIElement) -> bool {
        let field_matches =
            |expected: &str, read: &dyn Fn() -> Result<String, AutomationError>| {
                expected.is_empty() || read().map(|actual| actual == expected).unwrap_or(false)
            };
        field_matches(&self.automation_id, &|| element.automation_id())
            && field_matches(&self.class_name, &|| element.class_name())
            && field_matches(&self.control_type, &|| element.control_type())
            && field_matches(&self.name, &|| element.name())
    }

    /// Relaxed match: control type and class name equal, compared as stored
    /// (an empty segment field only matches an element with an empty value).
    pub fn matches_loosely(&self, element: &UIElement) -> bool {
        let control_type = match element.control_type() {
            Ok(ct) => ct,
            Err(_) => return false,
        };
        let class_name = match element.class_name() {
            Ok(cn) => cn,
            Err(_) => return false,
        };
        control_type == self.control_type && class_name == self.class_name
    }
}

/// Serializable address of a UI element, used to find it again later.
///
/// A descriptor is never changed once captured. Resolution always starts from the
/// live tree root; see [`crate::ElementResolver`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorDescriptor {
    #[serde(default)]
    automation_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    class_name: String,
    #[serde(default)]
    control_type: String,
    #[serde(default)]
    process_id: u32,
    #[serde(default)]
    path: Vec<PathSegment>,
}

impl LocatorDescriptor {
    pub fn builder() -> LocatorDescriptorBuilder {
        LocatorDescriptorBuilder::default()
    }

    /// Capture a descriptor from a live element, recording up to `max_depth`
    /// ancestors in root-to-element order.
    #[instrument(level = "debug", skip(element))]
    pub fn capture(element: &UIElement, max_depth: usize) -> Self {
        let mut path = Vec::new();
        let mut current = Some(element.clone());
        let mut depth = 0;

        while let Some(node) = current.take() {
            if depth >= max_depth {
                break;
            }
            path.insert(0, PathSegment::from_element(&node));
            match node.parent() {
                Ok(Some(parent)) if parent != node => {
                    current = Some(parent);
                    depth += 1;
                }
                Ok(_) => break,
                Err(e) => {
                    debug!("Stopping ancestor walk at depth {}: {}", depth, e);
                    break;
                }
            }
        }

        let descriptor = Self {
            automation_id: element.automation_id().unwrap_or_default(),
            name: element.name().unwrap_or_default(),
            class_name: element.class_name().unwrap_or_default(),
            control_type: element.control_type().unwrap_or_default(),
            process_id: element.process_id().unwrap_or_default(),
            path,
        };
        debug!(
            path_len = descriptor.path.len(),
            "Captured locator for {:?}", descriptor.name
        );
        descriptor
    }

    pub fn automation_id(&self) -> &str {
        &self.automation_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn control_type(&self) -> &str {
        &self.control_type
    }

    /// Owning process at capture time, if it was known.
    pub fn process_id(&self) -> Option<u32> {
        (self.process_id != 0).then_some(self.process_id)
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Human-readable label: name, then automation id.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else {
            &self.automation_id
        }
    }

    /// Property filter built from the non-empty control type, class name and name.
    ///
    /// A control type that does not map to a known type adds no constraint.
    pub fn property_condition(&self) -> PropertyCondition {
        let mut condition = PropertyCondition::new();
        if !self.control_type.is_empty() {
            match ControlType::parse(&self.control_type) {
                Some(ct) => condition = condition.with_control_type(ct),
                None => debug!("Unknown control type {:?}, not filtering on it", self.control_type),
            }
        }
        if !self.class_name.is_empty() {
            condition = condition.with_class_name(self.class_name.clone());
        }
        if !self.name.is_empty() {
            condition = condition.with_name(self.name.clone());
        }
        condition
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Builder for descriptors created outside of [`LocatorDescriptor::capture`].
#[derive(Debug, Default)]
pub struct LocatorDescriptorBuilder {
    inner: LocatorDescriptor,
}

impl LocatorDescriptorBuilder {
    pub fn automation_id(mut self, automation_id: impl Into<String>) -> Self {
        self.inner.automation_id = automation_id.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = name.into();
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.inner.class_name = class_name.into();
        self
    }

    pub fn control_type(mut self, control_type: impl Into<String>) -> Self {
        self.inner.control_type = control_type.into();
        self
    }

    pub fn process_id(mut self, process_id: u32) -> Self {
        self.inner.process_id = process_id;
        self
    }

    pub fn path(mut self, path: Vec<PathSegment>) -> Self {
        self.inner.path = path;
        self
    }

    pub fn segment(mut self, segment: PathSegment) -> Self {
        self.inner.path.push(segment);
        self
    }

    pub fn build(self) -> LocatorDescriptor {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_missing_fields() {
        let json = r#"{"automation_id": "txtTotal", "path": [{"name": "Desktop"}]}"#;
        let locator = LocatorDescriptor::from_json(json).unwrap();
        assert_eq!(locator.automation_id(), "txtTotal");
        assert_eq!(locator.name(), "");
        assert_eq!(locator.process_id(), None);
        assert_eq!(locator.path().len(), 1);
        assert_eq!(locator.path()[0].control_type, "");
    }

    #[test]
    fn test_serialized_field_names() {
        let locator = LocatorDescriptor::builder()
            .automation_id("a")
            .control_type("EditControl")
            .process_id(42)
            .build();
        let value: serde_json::Value = serde_json::from_str(&locator.to_json().unwrap()).unwrap();
        assert_eq!(value["automation_id"], "a");
        assert_eq!(value["control_type"], "EditControl");
        assert_eq!(value["process_id"], 42);
        assert!(value["path"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_property_condition_skips_unknown_control_type() {
        let locator = LocatorDescriptor::builder()
            .control_type("FancyWidget")
            .class_name("Chrome_WidgetWin_1")
            .build();
        let condition = locator.property_condition();
        assert_eq!(condition.control_type, None);
        assert_eq!(condition.class_name.as_deref(), Some("Chrome_WidgetWin_1"));
        assert!(condition.name.is_none());
    }

    #[test]
    fn test_display_name_falls_back_to_automation_id() {
        let locator = LocatorDescriptor::builder().automation_id("lblStatus").build();
        assert_eq!(locator.display_name(), "lblStatus");
    }
}
