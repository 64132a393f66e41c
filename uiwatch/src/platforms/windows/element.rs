//! Windows UI Element implementation

use super::types::ThreadSafeWinUIElement;
use super::utils::{
    control_type_name, convert_uiautomation_element, create_ui_automation_with_com_init,
    generate_element_id,
};
use crate::element::UIElementImpl;
use crate::patterns::{PatternKind, PatternValue, ToggleState};
use crate::{AutomationError, UIElement};
use std::fmt::Debug;
use tracing::debug;
use uiautomation::patterns;
use uiautomation::types::TreeScope;

pub struct WindowsUIElement {
    pub(crate) element: ThreadSafeWinUIElement,
}

impl WindowsUIElement {
    /// Get the raw UI element for direct automation
    pub fn get_raw_element(&self) -> &uiautomation::UIElement {
        &self.element.0
    }

    fn unsupported(kind: PatternKind, e: uiautomation::Error) -> AutomationError {
        AutomationError::PatternNotSupported(format!("{kind}: {e}"))
    }

    fn read_pattern(&self, kind: PatternKind) -> Result<PatternValue, AutomationError> {
        let element = &self.element.0;
        match kind {
            PatternKind::Value => {
                let pattern = element
                    .get_pattern::<patterns::UIValuePattern>()
                    .map_err(|e| Self::unsupported(kind, e))?;
                Ok(PatternValue::Value(pattern.get_value()?))
            }
            PatternKind::Text => {
                let pattern = element
                    .get_pattern::<patterns::UITextPattern>()
                    .map_err(|e| Self::unsupported(kind, e))?;
                let range = pattern.get_document_range()?;
                Ok(PatternValue::Text(range.get_text(-1)?))
            }
            PatternKind::RangeValue => {
                let pattern = element
                    .get_pattern::<patterns::UIRangeValuePattern>()
                    .map_err(|e| Self::unsupported(kind, e))?;
                Ok(PatternValue::RangeValue(pattern.get_value()?))
            }
            PatternKind::Selection => {
                let pattern = element
                    .get_pattern::<patterns::UISelectionPattern>()
                    .map_err(|e| Self::unsupported(kind, e))?;
                let names = pattern
                    .get_selection()?
                    .iter()
                    .map(|selected| selected.get_name().unwrap_or_default())
                    .collect();
                Ok(PatternValue::Selection(names))
            }
            PatternKind::Toggle => {
                let pattern = element
                    .get_pattern::<patterns::UITogglePattern>()
                    .map_err(|e| Self::unsupported(kind, e))?;
                let state = match pattern.get_toggle_state()? as i32 {
                    0 => ToggleState::Off,
                    1 => ToggleState::On,
                    _ => ToggleState::Indeterminate,
                };
                Ok(PatternValue::Toggle(state))
            }
        }
    }
}

impl Debug for WindowsUIElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowsUIElement")
            .field("name", &self.element.0.get_name().unwrap_or_default())
            .finish()
    }
}

impl UIElementImpl for WindowsUIElement {
    fn object_id(&self) -> usize {
        generate_element_id(&self.element.0)
    }

    fn automation_id(&self) -> Result<String, AutomationError> {
        Ok(self.element.0.get_automation_id()?)
    }

    fn name(&self) -> Result<String, AutomationError> {
        Ok(self.element.0.get_name()?)
    }

    fn class_name(&self) -> Result<String, AutomationError> {
        Ok(self.element.0.get_classname()?)
    }

    fn control_type(&self) -> Result<String, AutomationError> {
        Ok(control_type_name(self.element.0.get_control_type()?))
    }

    fn process_id(&self) -> Result<u32, AutomationError> {
        self.element.0.get_process_id().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get process ID for element: {e}"))
        })
    }

    fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        let temp_automation = create_ui_automation_with_com_init()?;
        let true_condition = temp_automation.create_true_condition().map_err(|e| {
            AutomationError::PlatformError(format!(
                "Failed to create true condition for children: {e}"
            ))
        })?;
        let children = self
            .element
            .0
            .find_all(TreeScope::Children, &true_condition)
            .map_err(|e| AutomationError::PlatformError(format!("Failed to get children: {e}")))?;

        Ok(children
            .into_iter()
            .map(convert_uiautomation_element)
            .collect())
    }

    fn parent(&self) -> Result<Option<UIElement>, AutomationError> {
        // Parent through the raw view walker
        let temp_automation = create_ui_automation_with_com_init().map_err(|e| {
            AutomationError::PlatformError(format!(
                "Failed to create UI automation for parent navigation: {e}"
            ))
        })?;

        let walker = temp_automation.get_raw_view_walker().map_err(|e| {
            AutomationError::PlatformError(format!(
                "Failed to get tree walker for parent navigation: {e}"
            ))
        })?;

        match walker.get_parent(&self.element.0) {
            Ok(parent_element) => Ok(Some(convert_uiautomation_element(parent_element))),
            Err(e) => {
                // No parent: this is the desktop root
                debug!("TreeWalker get_parent failed: {}", e);
                Ok(None)
            }
        }
    }

    fn is_available(&self) -> bool {
        self.element.0.get_process_id().is_ok()
    }

    fn get_pattern(&self, kind: PatternKind) -> Result<PatternValue, AutomationError> {
        self.read_pattern(kind)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(WindowsUIElement {
            element: self.element.clone(),
        })
    }
}
