//! UI tree snapshot building

use crate::patterns::{PatternKind, PatternSnapshot};
use crate::platforms::TreeBuildConfig;
use crate::{AutomationError, UIElement, UINode};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::debug;

const ALL_PATTERN_KINDS: [PatternKind; 5] = [
    PatternKind::Value,
    PatternKind::Text,
    PatternKind::RangeValue,
    PatternKind::Selection,
    PatternKind::Toggle,
];

/// Context for tracking tree building progress and stats
pub(crate) struct TreeBuildingContext<'a> {
    pub(crate) timeout_per_operation: Option<Duration>,
    pub(crate) yield_every_n_elements: usize,
    pub(crate) max_depth: Option<usize>,
    pub(crate) focused: Option<&'a UIElement>,
    pub(crate) elements_processed: usize,
    pub(crate) max_depth_reached: usize,
    pub(crate) timeouts: usize,
    pub(crate) errors_encountered: usize,
}

impl<'a> TreeBuildingContext<'a> {
    pub(crate) fn new(config: &TreeBuildConfig, focused: Option<&'a UIElement>) -> Self {
        Self {
            timeout_per_operation: config.timeout_per_operation_ms.map(Duration::from_millis),
            yield_every_n_elements: config.yield_every_n_elements.unwrap_or(0),
            max_depth: config.max_depth,
            focused,
            elements_processed: 0,
            max_depth_reached: 0,
            timeouts: 0,
            errors_encountered: 0,
        }
    }

    fn should_yield(&self) -> bool {
        self.yield_every_n_elements > 0
            && self.elements_processed > 0
            && self.elements_processed % self.yield_every_n_elements == 0
    }
}

/// Walk `element` into a [`UINode`] tree.
///
/// Unreadable properties are left empty and children that cannot be enumerated
/// within the per-operation timeout are dropped, so a partial tree is returned
/// rather than an error.
pub fn build_ui_node_tree(
    element: &UIElement,
    config: &TreeBuildConfig,
    focused: Option<&UIElement>,
) -> UINode {
    let mut context = TreeBuildingContext::new(config, focused);
    let node = build_node(element, 0, &mut context);
    debug!(
        elements = context.elements_processed,
        max_depth = context.max_depth_reached,
        timeouts = context.timeouts,
        errors = context.errors_encountered,
        "Tree snapshot built"
    );
    node
}

fn build_node(element: &UIElement, depth: usize, context: &mut TreeBuildingContext) -> UINode {
    context.elements_processed += 1;
    context.max_depth_reached = context.max_depth_reached.max(depth);

    // Yield CPU periodically so huge trees do not starve the UI thread
    if context.should_yield() {
        thread::sleep(Duration::from_millis(1));
    }

    let mut node = UINode {
        automation_id: element.automation_id().unwrap_or_default(),
        name: element.name().unwrap_or_default(),
        class_name: element.class_name().unwrap_or_default(),
        control_type: element.control_type().unwrap_or_default(),
        process_id: element.process_id().unwrap_or_default(),
        patterns: read_patterns(element),
        is_focused: context.focused.is_some_and(|f| f == element),
        children: Vec::new(),
    };

    if context.max_depth.is_some_and(|max| depth >= max) {
        return node;
    }

    match get_element_children_safe(element, context) {
        Ok(children) => {
            for child in &children {
                node.children.push(build_node(child, depth + 1, context));
            }
        }
        Err(e) => {
            debug!("Failed to get children for element: {}. Proceeding with no children.", e);
            context.errors_encountered += 1;
        }
    }
    node
}

fn read_patterns(element: &UIElement) -> PatternSnapshot {
    let mut snapshot = PatternSnapshot::default();
    for kind in ALL_PATTERN_KINDS {
        if let Ok(value) = element.pattern_value(kind) {
            snapshot.set(value);
        }
    }
    snapshot
}

/// Child enumeration, retried on a helper thread with a timeout when the direct call fails
fn get_element_children_safe(
    element: &UIElement,
    context: &mut TreeBuildingContext,
) -> Result<Vec<UIElement>, AutomationError> {
    match element.children() {
        Ok(children) => Ok(children),
        Err(e) => match context.timeout_per_operation {
            Some(timeout) => {
                debug!("Retrying child enumeration after error: {}", e);
                let result = get_element_children_with_timeout(element, timeout);
                if matches!(result, Err(AutomationError::Timeout(_))) {
                    context.timeouts += 1;
                }
                result
            }
            None => Err(e),
        },
    }
}

/// Get element children on a helper thread, giving up after `timeout`
pub(crate) fn get_element_children_with_timeout(
    element: &UIElement,
    timeout: Duration,
) -> Result<Vec<UIElement>, AutomationError> {
    let (sender, receiver) = mpsc::channel();
    let element_clone = element.clone();

    thread::spawn(move || {
        let children_result = element_clone.children();
        let _ = sender.send(children_result);
    });

    match receiver.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => {
            debug!("Timeout getting element children after {:?}", timeout);
            Err(AutomationError::Timeout(
                "Timeout getting element children".to_string(),
            ))
        }
    }
}
