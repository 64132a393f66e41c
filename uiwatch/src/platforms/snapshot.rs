//! Accessibility engine backed by a captured [`UINode`] tree
//!
//! Lets resolution and extraction run without a live desktop, against a dump
//! written by `dump-tree` or a tree assembled in code.

use crate::element::UIElementImpl;
use crate::patterns::{PatternKind, PatternSnapshot, PatternValue};
use crate::platforms::AccessibilityEngine;
use crate::{AutomationError, UIElement, UINode};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug)]
struct FlatNode {
    automation_id: String,
    name: String,
    class_name: String,
    control_type: String,
    process_id: u32,
    patterns: PatternSnapshot,
    is_focused: bool,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Arena holding one version of the tree. Index 0 is the root.
#[derive(Debug)]
struct SnapshotTree {
    generation: u64,
    nodes: Vec<FlatNode>,
}

impl SnapshotTree {
    fn from_root(root: &UINode, generation: u64) -> Self {
        let mut nodes = Vec::new();
        Self::flatten(root, None, &mut nodes);
        Self { generation, nodes }
    }

    fn flatten(node: &UINode, parent: Option<usize>, nodes: &mut Vec<FlatNode>) -> usize {
        let index = nodes.len();
        nodes.push(FlatNode {
            automation_id: node.automation_id.clone(),
            name: node.name.clone(),
            class_name: node.class_name.clone(),
            control_type: node.control_type.clone(),
            process_id: node.process_id,
            patterns: node.patterns.clone(),
            is_focused: node.is_focused,
            parent,
            children: Vec::with_capacity(node.children.len()),
        });
        for child in &node.children {
            let child_index = Self::flatten(child, Some(index), nodes);
            nodes[index].children.push(child_index);
        }
        index
    }
}

/// Engine serving a static tree. The tree can be swapped with [`SnapshotEngine::update`];
/// elements handed out earlier keep pointing at the version they came from and
/// report themselves unavailable once it has been replaced.
pub struct SnapshotEngine {
    tree: Arc<RwLock<Arc<SnapshotTree>>>,
}

impl SnapshotEngine {
    pub fn new(root: UINode) -> Self {
        Self {
            tree: Arc::new(RwLock::new(Arc::new(SnapshotTree::from_root(&root, 0)))),
        }
    }

    /// Load a tree written as JSON by `dump-tree`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AutomationError::InvalidArgument(format!("Cannot read {}: {e}", path.display()))
        })?;
        let root: UINode = serde_json::from_str(&json)?;
        Ok(Self::new(root))
    }

    /// Replace the served tree.
    pub fn update(&self, root: UINode) {
        let mut guard = self.tree.write().unwrap_or_else(|e| e.into_inner());
        let generation = guard.generation + 1;
        *guard = Arc::new(SnapshotTree::from_root(&root, generation));
        debug!(generation, nodes = guard.nodes.len(), "Snapshot tree replaced");
    }

    fn element(&self, index: usize) -> UIElement {
        let tree = self.tree.read().unwrap_or_else(|e| e.into_inner()).clone();
        UIElement::new(Box::new(SnapshotElement {
            tree,
            index,
            live: self.tree.clone(),
        }))
    }
}

impl AccessibilityEngine for SnapshotEngine {
    fn get_root_element(&self) -> Result<UIElement, AutomationError> {
        Ok(self.element(0))
    }

    fn get_focused_element(&self) -> Result<UIElement, AutomationError> {
        let index = {
            let tree = self.tree.read().unwrap_or_else(|e| e.into_inner());
            tree.nodes.iter().position(|node| node.is_focused)
        };
        index.map(|index| self.element(index)).ok_or_else(|| {
            AutomationError::ElementNotFound("No focused element in snapshot".to_string())
        })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotElement {
    tree: Arc<SnapshotTree>,
    index: usize,
    live: Arc<RwLock<Arc<SnapshotTree>>>,
}

impl SnapshotElement {
    fn node(&self) -> &FlatNode {
        &self.tree.nodes[self.index]
    }

    fn relative(&self, index: usize) -> UIElement {
        UIElement::new(Box::new(SnapshotElement {
            tree: self.tree.clone(),
            index,
            live: self.live.clone(),
        }))
    }
}

impl UIElementImpl for SnapshotElement {
    fn object_id(&self) -> usize {
        self.index
    }

    fn automation_id(&self) -> Result<String, AutomationError> {
        Ok(self.node().automation_id.clone())
    }

    fn name(&self) -> Result<String, AutomationError> {
        Ok(self.node().name.clone())
    }

    fn class_name(&self) -> Result<String, AutomationError> {
        Ok(self.node().class_name.clone())
    }

    fn control_type(&self) -> Result<String, AutomationError> {
        Ok(self.node().control_type.clone())
    }

    fn process_id(&self) -> Result<u32, AutomationError> {
        Ok(self.node().process_id)
    }

    fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        Ok(self
            .node()
            .children
            .iter()
            .map(|&index| self.relative(index))
            .collect())
    }

    fn parent(&self) -> Result<Option<UIElement>, AutomationError> {
        Ok(self.node().parent.map(|index| self.relative(index)))
    }

    fn is_available(&self) -> bool {
        let live = self.live.read().unwrap_or_else(|e| e.into_inner());
        Arc::ptr_eq(&self.tree, &*live)
    }

    fn get_pattern(&self, kind: PatternKind) -> Result<PatternValue, AutomationError> {
        self.node().patterns.get(kind).ok_or_else(|| {
            AutomationError::PatternNotSupported(format!("{kind} on snapshot node {}", self.index))
        })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(self.clone())
    }
}
