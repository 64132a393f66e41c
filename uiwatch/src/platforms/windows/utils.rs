//! Utility functions and type conversions for Windows platform

use super::element::WindowsUIElement;
use super::types::ThreadSafeWinUIElement;
use crate::selector::{ControlType, PropertyCondition};
use crate::{AutomationError, UIElement};
use std::sync::Arc;
use uiautomation::core::UICondition;
use uiautomation::types::UIProperty;
use uiautomation::variants::Variant;
use uiautomation::UIAutomation;
use windows::core::HRESULT;
use windows::Win32::System::Com::{CoInitializeEx, COINIT_MULTITHREADED};

/// RPC_E_CHANGED_MODE: COM already initialized on this thread with another model
const RPC_E_CHANGED_MODE: HRESULT = HRESULT(0x80010106u32 as i32);

/// Identity of a native element. Uses the runtime id, which UI Automation keeps
/// unique for the lifetime of the node, and falls back to a property hash.
pub fn generate_element_id(element: &uiautomation::UIElement) -> usize {
    let mut to_hash = String::new();
    match element.get_runtime_id() {
        Ok(runtime_id) if !runtime_id.is_empty() => {
            for part in runtime_id {
                to_hash.push_str(&part.to_string());
                to_hash.push('.');
            }
        }
        _ => {
            to_hash.push_str(&element.get_automation_id().unwrap_or_default());
            to_hash.push('|');
            to_hash.push_str(&element.get_name().unwrap_or_default());
            to_hash.push('|');
            to_hash.push_str(&element.get_classname().unwrap_or_default());
            if let Ok(pid) = element.get_process_id() {
                to_hash.push_str(&format!("|{pid}"));
            }
        }
    }

    let hash = blake3::hash(to_hash.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes) as usize
}

/// Wrap a raw uiautomation element
pub fn convert_uiautomation_element(element: uiautomation::UIElement) -> UIElement {
    #[allow(clippy::arc_with_non_send_sync)]
    let arc_ele = ThreadSafeWinUIElement(Arc::new(element));
    UIElement::new(Box::new(WindowsUIElement { element: arc_ele }))
}

/// Initialize COM in the multithreaded apartment for the calling thread
pub(crate) fn init_com_for_thread() -> Result<(), AutomationError> {
    unsafe {
        let hr = CoInitializeEx(None, COINIT_MULTITHREADED);
        if hr.is_err() && hr != RPC_E_CHANGED_MODE {
            return Err(AutomationError::PlatformError(format!(
                "Failed to initialize COM: {hr}"
            )));
        }
    }
    Ok(())
}

/// Helper function to create UIAutomation instance with proper COM initialization
pub(crate) fn create_ui_automation_with_com_init() -> Result<UIAutomation, AutomationError> {
    init_com_for_thread()?;
    UIAutomation::new_direct().map_err(|e| AutomationError::PlatformError(e.to_string()))
}

/// Control type name in its `...Control` form
pub(crate) fn control_type_name(control_type: uiautomation::controls::ControlType) -> String {
    match ControlType::from_code(control_type as i32) {
        Some(ct) => ct.type_name(),
        None => format!("{control_type:?}Control"),
    }
}

/// Translate a property condition into a native UI Automation condition
pub(crate) fn build_native_condition(
    automation: &UIAutomation,
    condition: &PropertyCondition,
) -> Result<UICondition, AutomationError> {
    let mut parts = Vec::new();
    if let Some(automation_id) = &condition.automation_id {
        parts.push(automation.create_property_condition(
            UIProperty::AutomationId,
            Variant::from(automation_id.as_str()),
            None,
        )?);
    }
    if let Some(control_type) = condition.control_type {
        parts.push(automation.create_property_condition(
            UIProperty::ControlType,
            Variant::from(control_type.code()),
            None,
        )?);
    }
    if let Some(class_name) = &condition.class_name {
        parts.push(automation.create_property_condition(
            UIProperty::ClassName,
            Variant::from(class_name.as_str()),
            None,
        )?);
    }
    if let Some(name) = &condition.name {
        parts.push(automation.create_property_condition(
            UIProperty::Name,
            Variant::from(name.as_str()),
            None,
        )?);
    }

    let mut parts = parts.into_iter();
    let Some(first) = parts.next() else {
        return Ok(automation.create_true_condition()?);
    };
    parts.try_fold(first, |acc, next| {
        automation
            .create_and_condition(acc, next)
            .map_err(AutomationError::from)
    })
}
