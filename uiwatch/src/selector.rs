//! Property conditions used to search the accessibility tree

use crate::element::UIElement;
use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Control types known to the accessibility tree, with their UI Automation type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlType {
    Button,
    Calendar,
    CheckBox,
    ComboBox,
    Edit,
    Hyperlink,
    Image,
    ListItem,
    List,
    Menu,
    MenuBar,
    MenuItem,
    ProgressBar,
    RadioButton,
    ScrollBar,
    Slider,
    Spinner,
    StatusBar,
    Tab,
    TabItem,
    Text,
    ToolBar,
    ToolTip,
    Tree,
    TreeItem,
    Custom,
    Group,
    Thumb,
    DataGrid,
    DataItem,
    Document,
    SplitButton,
    Window,
    Pane,
    Header,
    HeaderItem,
    Table,
    TitleBar,
    Separator,
    SemanticZoom,
    AppBar,
}

const ALL_CONTROL_TYPES: [ControlType; 41] = [
    ControlType::Button,
    ControlType::Calendar,
    ControlType::CheckBox,
    ControlType::ComboBox,
    ControlType::Edit,
    ControlType::Hyperlink,
    ControlType::Image,
    ControlType::ListItem,
    ControlType::List,
    ControlType::Menu,
    ControlType::MenuBar,
    ControlType::MenuItem,
    ControlType::ProgressBar,
    ControlType::RadioButton,
    ControlType::ScrollBar,
    ControlType::Slider,
    ControlType::Spinner,
    ControlType::StatusBar,
    ControlType::Tab,
    ControlType::TabItem,
    ControlType::Text,
    ControlType::ToolBar,
    ControlType::ToolTip,
    ControlType::Tree,
    ControlType::TreeItem,
    ControlType::Custom,
    ControlType::Group,
    ControlType::Thumb,
    ControlType::DataGrid,
    ControlType::DataItem,
    ControlType::Document,
    ControlType::SplitButton,
    ControlType::Window,
    ControlType::Pane,
    ControlType::Header,
    ControlType::HeaderItem,
    ControlType::Table,
    ControlType::TitleBar,
    ControlType::Separator,
    ControlType::SemanticZoom,
    ControlType::AppBar,
];

const FIRST_CONTROL_TYPE_CODE: i32 = 50000;

impl ControlType {
    /// UI Automation control type identifier (`UIA_ButtonControlTypeId` = 50000, ...)
    pub fn code(self) -> i32 {
        let index = ALL_CONTROL_TYPES
            .iter()
            .position(|ct| *ct == self)
            .unwrap_or_default();
        FIRST_CONTROL_TYPE_CODE + index as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let index = usize::try_from(code - FIRST_CONTROL_TYPE_CODE).ok()?;
        ALL_CONTROL_TYPES.get(index).copied()
    }

    /// Short name, e.g. `Edit`
    pub fn name(self) -> String {
        format!("{self:?}")
    }

    /// Name in the form stored in locators, e.g. `EditControl`
    pub fn type_name(self) -> String {
        format!("{self:?}Control")
    }

    /// Parse a control type name. Accepts both `Edit` and `EditControl`, case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        let base = trimmed
            .strip_suffix("Control")
            .or_else(|| trimmed.strip_suffix("control"))
            .unwrap_or(trimmed);
        if base.is_empty() {
            return None;
        }
        ALL_CONTROL_TYPES
            .iter()
            .copied()
            .find(|ct| ct.name().eq_ignore_ascii_case(base))
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// A conjunction of element properties. Unset fields do not constrain the match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyCondition {
    pub automation_id: Option<String>,
    pub name: Option<String>,
    pub class_name: Option<String>,
    pub control_type: Option<ControlType>,
}

impl PropertyCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn automation_id(id: impl Into<String>) -> Self {
        Self {
            automation_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_control_type(mut self, control_type: ControlType) -> Self {
        self.control_type = Some(control_type);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.automation_id.is_none()
            && self.name.is_none()
            && self.class_name.is_none()
            && self.control_type.is_none()
    }

    /// Check the condition against a live element, reading only the properties it constrains.
    pub fn matches(&self, element: &UIElement) -> Result<bool, AutomationError> {
        if let Some(automation_id) = &self.automation_id {
            if element.automation_id()? != *automation_id {
                return Ok(false);
            }
        }
        if let Some(control_type) = self.control_type {
            if ControlType::parse(&element.control_type()?) != Some(control_type) {
                return Ok(false);
            }
        }
        if let Some(class_name) = &self.class_name {
            if element.class_name()? != *class_name {
                return Ok(false);
            }
        }
        if let Some(name) = &self.name {
            if element.name()? != *name {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for PropertyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(id) = &self.automation_id {
            parts.push(format!("automation_id={id:?}"));
        }
        if let Some(ct) = self.control_type {
            parts.push(format!("control_type={ct}"));
        }
        if let Some(class_name) = &self.class_name {
            parts.push(format!("class_name={class_name:?}"));
        }
        if let Some(name) = &self.name {
            parts.push(format!("name={name:?}"));
        }
        if parts.is_empty() {
            f.write_str("<any>")
        } else {
            f.write_str(&parts.join(" && "))
        }
    }
}
