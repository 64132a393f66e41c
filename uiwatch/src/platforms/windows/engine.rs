#![allow(clippy::arc_with_non_send_sync)]

use crate::platforms::windows::types::{ThreadSafeWinUIAutomation, ThreadSafeWinUIElement};
use crate::platforms::windows::utils::{
    build_native_condition, convert_uiautomation_element, create_ui_automation_with_com_init,
    init_com_for_thread,
};
use crate::platforms::windows::WindowsUIElement;
use crate::platforms::AccessibilityEngine;
use crate::selector::PropertyCondition;
use crate::{AutomationError, UIElement};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;
use uiautomation::types::TreeScope;

pub struct WindowsEngine {
    pub automation: ThreadSafeWinUIAutomation,
}

impl WindowsEngine {
    pub fn new() -> Result<Self, AutomationError> {
        let automation = create_ui_automation_with_com_init()?;
        Ok(Self {
            automation: ThreadSafeWinUIAutomation(Arc::new(automation)),
        })
    }

    fn raw_root(root: &UIElement) -> Result<ThreadSafeWinUIElement, AutomationError> {
        root.as_any()
            .downcast_ref::<WindowsUIElement>()
            .map(|win| win.element.clone())
            .ok_or_else(|| {
                AutomationError::InvalidArgument(
                    "Search root does not belong to the Windows engine".to_string(),
                )
            })
    }

    /// Native descendant search. Not-found comes back from UI Automation as an
    /// error, which is reported as `Ok(None)`.
    fn find_first_native(
        root: &ThreadSafeWinUIElement,
        condition: &PropertyCondition,
    ) -> Result<Option<ThreadSafeWinUIElement>, AutomationError> {
        let automation = create_ui_automation_with_com_init()?;
        let native_condition = build_native_condition(&automation, condition)?;
        match root.0.find_first(TreeScope::Descendants, &native_condition) {
            Ok(found) => Ok(Some(ThreadSafeWinUIElement(Arc::new(found)))),
            Err(e) => {
                debug!("No element for {}: {}", condition, e);
                Ok(None)
            }
        }
    }
}

impl AccessibilityEngine for WindowsEngine {
    fn get_root_element(&self) -> Result<UIElement, AutomationError> {
        let root = self.automation.0.get_root_element().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get desktop root: {e}"))
        })?;
        Ok(convert_uiautomation_element(root))
    }

    fn get_focused_element(&self) -> Result<UIElement, AutomationError> {
        let element = self
            .automation
            .0
            .get_focused_element()
            .map_err(|e| AutomationError::ElementNotFound(e.to_string()))?;
        Ok(convert_uiautomation_element(element))
    }

    fn find_first(
        &self,
        root: &UIElement,
        condition: &PropertyCondition,
        timeout: Option<Duration>,
    ) -> Result<Option<UIElement>, AutomationError> {
        let raw_root = Self::raw_root(root)?;

        let Some(timeout) = timeout else {
            let found = Self::find_first_native(&raw_root, condition)?;
            return Ok(found.map(|e| UIElement::new(Box::new(WindowsUIElement { element: e }))));
        };

        // Search on a helper thread, bounded by the timeout
        let (sender, receiver) = mpsc::channel();
        let condition_clone = condition.clone();
        thread::spawn(move || {
            let result = Self::find_first_native(&raw_root, &condition_clone);
            let _ = sender.send(result);
        });

        match receiver.recv_timeout(timeout) {
            Ok(result) => {
                Ok(result?.map(|e| UIElement::new(Box::new(WindowsUIElement { element: e }))))
            }
            Err(_) => {
                debug!("Search for {} timed out after {:?}", condition, timeout);
                Err(AutomationError::Timeout(format!(
                    "Search for {condition} exceeded {timeout:?}"
                )))
            }
        }
    }

    fn attach_thread(&self) -> Result<(), AutomationError> {
        init_com_for_thread()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
