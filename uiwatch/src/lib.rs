//! Watch values of desktop UI elements through accessibility APIs
//!
//! An element picked once is stored as a [`LocatorDescriptor`]. On every poll the
//! descriptor is resolved against the live accessibility tree again, a value is
//! extracted from whichever pattern the element supports, derived through an
//! [`ExtractionMode`] and compared against a target with an [`Operator`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

pub mod config;
pub mod element;
pub mod errors;
pub mod evaluator;
pub mod extractor;
pub mod locator;
pub mod monitor;
pub mod patterns;
pub mod platforms;
pub mod resolver;
pub mod selector;
#[cfg(test)]
mod tests;
pub mod transform;

pub use config::MonitorConfig;
pub use element::{UIElement, UIElementImpl};
pub use errors::AutomationError;
pub use evaluator::{evaluate, Operator};
pub use extractor::extract_value;
pub use locator::{LocatorDescriptor, PathSegment};
pub use monitor::{
    AlertSink, ItemStatus, Monitor, MonitorEvent, MonitorHandle, MonitorItem, NullAlert,
    PollOutcome,
};
pub use patterns::{PatternKind, PatternSnapshot, PatternValue, ToggleState};
pub use platforms::{AccessibilityEngine, SnapshotEngine, TreeBuildConfig};
pub use resolver::ElementResolver;
pub use selector::{ControlType, PropertyCondition};
pub use transform::{transform, ExtractionMode};

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Represents a node in the UI tree, containing its properties and children.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UINode {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub automation_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub control_type: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub process_id: u32,
    #[serde(default, skip_serializing_if = "PatternSnapshot::is_empty")]
    pub patterns: PatternSnapshot,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_focused: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UINode>,
}

impl UINode {
    pub fn new(control_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            control_type: control_type.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_automation_id(mut self, automation_id: impl Into<String>) -> Self {
        self.automation_id = automation_id.into();
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    pub fn with_process_id(mut self, process_id: u32) -> Self {
        self.process_id = process_id;
        self
    }

    pub fn with_pattern(mut self, value: PatternValue) -> Self {
        self.patterns.set(value);
        self
    }

    pub fn with_focus(mut self) -> Self {
        self.is_focused = true;
        self
    }

    pub fn with_child(mut self, child: UINode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = UINode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Number of nodes in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(UINode::count).sum::<usize>()
    }

    fn write_outline_line(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{} {:?}", "", self.control_type, self.name, indent = depth * 2)?;
        if !self.automation_id.is_empty() {
            write!(f, " #{}", self.automation_id)?;
        }
        if !self.class_name.is_empty() {
            write!(f, " .{}", self.class_name)?;
        }
        if self.process_id != 0 {
            write!(f, " pid={}", self.process_id)?;
        }
        if self.is_focused {
            write!(f, " focused")?;
        }
        Ok(())
    }
}

/// Levels printed by the `Debug` outline before the rest of a subtree is summarized
const OUTLINE_MAX_DEPTH: usize = 64;

/// One line per node, indented by depth.
impl fmt::Debug for UINode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![(0usize, self)];
        let mut first = true;
        while let Some((depth, node)) = pending.pop() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            node.write_outline_line(f, depth)?;

            if node.children.is_empty() {
                continue;
            }
            if depth + 1 >= OUTLINE_MAX_DEPTH {
                let hidden = node.count() - 1;
                write!(f, "\n{:indent$}({} more nodes)", "", hidden, indent = (depth + 1) * 2)?;
                continue;
            }
            pending.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        }
        Ok(())
    }
}

/// The main entry point: an accessibility engine plus the operations built on it
#[derive(Clone)]
pub struct Desktop {
    engine: Arc<dyn AccessibilityEngine>,
    search_timeout: Option<Duration>,
}

impl Desktop {
    /// Connect to the live desktop of the current platform
    #[instrument]
    pub fn new() -> Result<Self, AutomationError> {
        let engine = platforms::create_engine()?;
        Ok(Self::with_engine(engine))
    }

    /// Use an existing engine, e.g. a [`SnapshotEngine`]
    pub fn with_engine(engine: Arc<dyn AccessibilityEngine>) -> Self {
        Self {
            engine,
            search_timeout: MonitorConfig::default().search_timeout(),
        }
    }

    pub fn with_search_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn engine(&self) -> &Arc<dyn AccessibilityEngine> {
        &self.engine
    }

    pub fn root(&self) -> Result<UIElement, AutomationError> {
        self.engine.get_root_element()
    }

    pub fn focused_element(&self) -> Result<UIElement, AutomationError> {
        self.engine.get_focused_element()
    }

    pub fn resolver(&self) -> ElementResolver {
        ElementResolver::new(self.engine.clone()).with_search_timeout(self.search_timeout)
    }

    pub fn resolve(&self, locator: &LocatorDescriptor) -> Option<UIElement> {
        self.resolver().resolve(locator)
    }

    /// Resolve `locator` and extract its current raw value
    pub fn read_value(&self, locator: &LocatorDescriptor) -> Option<String> {
        self.resolve(locator).map(|element| extract_value(&element))
    }

    /// Capture a descriptor for the element that currently has keyboard focus
    pub fn capture_focused(&self, max_depth: usize) -> Result<LocatorDescriptor, AutomationError> {
        let element = self.focused_element()?;
        Ok(LocatorDescriptor::capture(&element, max_depth))
    }

    /// Snapshot the tree below the root, or below the first top-level window of `pid`
    #[instrument(skip(self, config))]
    pub fn dump_tree(
        &self,
        pid: Option<u32>,
        config: &TreeBuildConfig,
    ) -> Result<UINode, AutomationError> {
        let root = self.root()?;
        let start = match pid {
            Some(pid) => root
                .children()?
                .into_iter()
                .find(|window| window.process_id().map(|p| p == pid).unwrap_or(false))
                .ok_or_else(|| {
                    AutomationError::ElementNotFound(format!("No window for process {pid}"))
                })?,
            None => root,
        };
        let focused = self.focused_element().ok();
        let node = platforms::tree_builder::build_ui_node_tree(&start, config, focused.as_ref());
        debug!(nodes = node.count(), "Dumped tree");
        Ok(node)
    }
}
