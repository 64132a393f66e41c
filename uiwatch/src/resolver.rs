//! Re-location of a previously captured element in the live tree

use crate::locator::{LocatorDescriptor, PathSegment};
use crate::platforms::AccessibilityEngine;
use crate::selector::PropertyCondition;
use crate::UIElement;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Finds the live element a [`LocatorDescriptor`] points at.
///
/// Strategies are tried in a fixed order, most reliable first: automation id,
/// then the structural path recorded at capture time, then a combination of
/// control type, class name and name. Every strategy starts over from the live
/// root, so nothing is carried between calls.
#[derive(Clone)]
pub struct ElementResolver {
    engine: Arc<dyn AccessibilityEngine>,
    search_timeout: Option<Duration>,
}

impl ElementResolver {
    pub fn new(engine: Arc<dyn AccessibilityEngine>) -> Self {
        Self {
            engine,
            search_timeout: None,
        }
    }

    /// Bound every tree-wide search by `timeout`. A timed out search counts as not found.
    pub fn with_search_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.search_timeout = timeout;
        self
    }

    /// Resolve `locator` to a live element, or `None` when no strategy finds it.
    ///
    /// Never fails: platform errors along the way are logged and treated as a miss.
    #[instrument(level = "debug", skip(self, locator), fields(element = %locator.display_name()))]
    pub fn resolve(&self, locator: &LocatorDescriptor) -> Option<UIElement> {
        let root = match self.engine.get_root_element() {
            Ok(root) => root,
            Err(e) => {
                debug!("Cannot get tree root: {}", e);
                return None;
            }
        };

        if !locator.automation_id().is_empty() {
            if let Some(element) = self.find_by_automation_id(&root, locator) {
                debug!("Resolved by automation id");
                return Some(element);
            }
        }

        if !locator.path().is_empty() {
            if let Some(element) = self.find_by_path(&root, locator.path()) {
                debug!("Resolved by path");
                return Some(element);
            }
        }

        if let Some(element) = self.find_by_properties(&root, locator) {
            debug!("Resolved by property combination");
            return Some(element);
        }

        debug!("All strategies failed");
        None
    }

    fn find_by_automation_id(
        &self,
        root: &UIElement,
        locator: &LocatorDescriptor,
    ) -> Option<UIElement> {
        let condition = PropertyCondition::automation_id(locator.automation_id());
        self.search(root, locator.process_id(), &condition)
    }

    fn find_by_properties(
        &self,
        root: &UIElement,
        locator: &LocatorDescriptor,
    ) -> Option<UIElement> {
        let condition = locator.property_condition();
        if condition.is_empty() {
            debug!("No usable properties for a property search");
            return None;
        }
        self.search(root, locator.process_id(), &condition)
    }

    /// Walk `path[1..]` from the root, one level of children per segment.
    /// `path[0]` is the root itself.
    fn find_by_path(&self, root: &UIElement, path: &[PathSegment]) -> Option<UIElement> {
        let mut current = root.clone();

        for (depth, segment) in path.iter().enumerate().skip(1) {
            let children = match current.children() {
                Ok(children) => children,
                Err(e) => {
                    debug!(depth, "Cannot enumerate children: {}", e);
                    return None;
                }
            };

            let next = children
                .iter()
                .find(|child| segment.matches_strictly(child))
                .or_else(|| children.iter().find(|child| segment.matches_loosely(child)));

            match next {
                Some(child) => current = child.clone(),
                None => {
                    debug!(depth, ?segment, "No child matches path segment");
                    return None;
                }
            }
        }

        Some(current)
    }

    /// Search the windows of `process_id` first, then the whole tree.
    fn search(
        &self,
        root: &UIElement,
        process_id: Option<u32>,
        condition: &PropertyCondition,
    ) -> Option<UIElement> {
        if let Some(pid) = process_id {
            for window in self.process_windows(root, pid) {
                if let Some(element) = self.find_present(&window, condition) {
                    return Some(element);
                }
            }
            debug!(pid, "No match inside process windows, searching whole tree");
        }
        self.find_present(root, condition)
    }

    fn process_windows(&self, root: &UIElement, pid: u32) -> Vec<UIElement> {
        match root.children() {
            Ok(windows) => windows
                .into_iter()
                .filter(|window| window.process_id().map(|p| p == pid).unwrap_or(false))
                .collect(),
            Err(e) => {
                debug!("Cannot enumerate top-level windows: {}", e);
                Vec::new()
            }
        }
    }

    fn find_present(&self, scope: &UIElement, condition: &PropertyCondition) -> Option<UIElement> {
        match self.engine.find_first(scope, condition, self.search_timeout) {
            Ok(Some(element)) if element.is_available() => Some(element),
            Ok(Some(_)) => {
                debug!("Match for {} vanished before it could be used", condition);
                None
            }
            Ok(None) => None,
            Err(e) => {
                debug!("Search for {} failed: {}", condition, e);
                None
            }
        }
    }
}
