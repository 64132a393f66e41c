//! Thread-safe wrappers around UI Automation COM objects

use crate::AutomationError;
use std::sync::Arc;
use uiautomation::UIAutomation;

/// Thread-safe wrapper for the UIAutomation COM object
#[derive(Clone)]
pub struct ThreadSafeWinUIAutomation(pub Arc<UIAutomation>);

// Safety: the automation object is created in the multithreaded apartment
unsafe impl Send for ThreadSafeWinUIAutomation {}
unsafe impl Sync for ThreadSafeWinUIAutomation {}

/// Thread-safe wrapper for UIElement
#[derive(Clone)]
pub(crate) struct ThreadSafeWinUIElement(pub(crate) Arc<uiautomation::UIElement>);

// Safety: UIElement is thread-safe when wrapped properly
unsafe impl Send for ThreadSafeWinUIElement {}
unsafe impl Sync for ThreadSafeWinUIElement {}

impl From<uiautomation::Error> for AutomationError {
    fn from(error: uiautomation::Error) -> Self {
        AutomationError::PlatformError(format!("UIAutomation error: {error}"))
    }
}
