use crate::selector::PropertyCondition;
use crate::{AutomationError, UIElement};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

pub mod snapshot;
pub mod tree_builder;

#[cfg(target_os = "windows")]
pub mod windows;

pub use snapshot::SnapshotEngine;

/// Configuration for tree snapshot building
#[derive(Debug, Clone)]
pub struct TreeBuildConfig {
    /// Optional timeout per child enumeration in milliseconds
    pub timeout_per_operation_ms: Option<u64>,
    /// Optional yield frequency for responsiveness
    pub yield_every_n_elements: Option<usize>,
    /// Maximum depth below the starting element
    pub max_depth: Option<usize>,
}

impl Default for TreeBuildConfig {
    fn default() -> Self {
        Self {
            timeout_per_operation_ms: Some(50),
            yield_every_n_elements: Some(50),
            max_depth: None,
        }
    }
}

/// The common trait that all accessibility back ends must implement
pub trait AccessibilityEngine: Send + Sync {
    /// Get the root of the tree (the desktop)
    fn get_root_element(&self) -> Result<UIElement, AutomationError>;

    /// Get the currently focused element
    fn get_focused_element(&self) -> Result<UIElement, AutomationError>;

    /// Find the first descendant of `root` matching `condition`, in document order.
    ///
    /// `Ok(None)` means nothing matched. The default walks the tree through
    /// [`UIElement::children`], skipping nodes that can no longer be read.
    fn find_first(
        &self,
        root: &UIElement,
        condition: &PropertyCondition,
        timeout: Option<Duration>,
    ) -> Result<Option<UIElement>, AutomationError> {
        find_first_by_walking(root, condition, timeout)
    }

    /// Prepare the calling thread for use with this engine.
    ///
    /// Engines bound to per-thread native state (COM) initialize it here. The
    /// monitor worker calls this once before its first cycle.
    fn attach_thread(&self) -> Result<(), AutomationError> {
        Ok(())
    }

    /// Enable downcasting to concrete engine types
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Depth-first search of `root`'s descendants.
pub(crate) fn find_first_by_walking(
    root: &UIElement,
    condition: &PropertyCondition,
    timeout: Option<Duration>,
) -> Result<Option<UIElement>, AutomationError> {
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut stack: Vec<UIElement> = match root.children() {
        Ok(children) => children.into_iter().rev().collect(),
        Err(e) => {
            debug!("Cannot enumerate children of search root: {}", e);
            return Ok(None);
        }
    };

    while let Some(element) = stack.pop() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(AutomationError::Timeout(format!(
                "Search for {condition} exceeded {:?}",
                timeout.unwrap_or_default()
            )));
        }
        match condition.matches(&element) {
            Ok(true) => return Ok(Some(element)),
            Ok(false) => {}
            Err(e) => debug!("Skipping unreadable element during search: {}", e),
        }
        if let Ok(children) = element.children() {
            stack.extend(children.into_iter().rev());
        }
    }
    Ok(None)
}

/// Create the appropriate engine for the current platform
pub fn create_engine() -> Result<Arc<dyn AccessibilityEngine>, AutomationError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsEngine::new()?))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Err(AutomationError::UnsupportedPlatform(
            "Live UI Automation is only available on Windows; use a snapshot engine".to_string(),
        ))
    }
}
