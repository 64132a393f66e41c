mod tree_tests;
#[cfg(target_os = "windows")]
mod windows_tests;

use crate::element::UIElementImpl;
use crate::patterns::{PatternKind, PatternValue, ToggleState};
use crate::platforms::{AccessibilityEngine, SnapshotEngine};
use crate::{AutomationError, UIElement, UINode};
use std::sync::Arc;

pub const LEDGER_PID: u32 = 4242;
pub const NOTES_PID: u32 = 5151;

/// Class name that makes every property read of a node fail
pub const BROKEN_CLASS: &str = "BrokenProvider";
/// Class name that makes pattern queries on a node panic
pub const PANICKING_CLASS: &str = "PanickingProvider";
/// Class name of nodes that are found by searches but report themselves gone
pub const VANISHED_CLASS: &str = "VanishedProvider";

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// A desktop with two application windows.
///
/// The notes window comes first and holds a decoy edit box with the same
/// automation id as the ledger's amount field.
pub fn sample_desktop() -> UINode {
    let notes = UINode::new("WindowControl", "Notes")
        .with_class_name("NotesMain")
        .with_process_id(NOTES_PID)
        .with_children([
            UINode::new("EditControl", "Scratch")
                .with_automation_id("txtAmount")
                .with_class_name("Edit")
                .with_process_id(NOTES_PID)
                .with_pattern(PatternValue::Value("decoy".to_string())),
            UINode::new("DocumentControl", "Body")
                .with_class_name("RichEdit")
                .with_process_id(NOTES_PID)
                .with_pattern(PatternValue::Text("Error: disk full".to_string())),
        ]);

    let ledger = UINode::new("WindowControl", "Billing - Ledger")
        .with_class_name("LedgerMain")
        .with_process_id(LEDGER_PID)
        .with_children([
            UINode::new("PaneControl", "")
                .with_class_name("ToolbarPane")
                .with_process_id(LEDGER_PID)
                .with_children([
                    UINode::new("TextControl", "Progress: 57%")
                        .with_class_name("Static")
                        .with_process_id(LEDGER_PID),
                    UINode::new("ProgressBarControl", "Upload")
                        .with_class_name("msctls_progress32")
                        .with_process_id(LEDGER_PID)
                        .with_pattern(PatternValue::RangeValue(57.0)),
                ]),
            UINode::new("EditControl", "Amount")
                .with_automation_id("txtAmount")
                .with_class_name("Edit")
                .with_process_id(LEDGER_PID)
                .with_pattern(PatternValue::Value("1,250.75".to_string()))
                .with_focus(),
            UINode::new("CheckBoxControl", "Paid")
                .with_automation_id("chkPaid")
                .with_class_name("Button")
                .with_process_id(LEDGER_PID)
                .with_pattern(PatternValue::Toggle(ToggleState::On)),
            UINode::new("ListControl", "Currency")
                .with_class_name("ListBox")
                .with_process_id(LEDGER_PID)
                .with_pattern(PatternValue::Selection(vec![
                    "EUR".to_string(),
                    String::new(),
                    "USD".to_string(),
                ])),
        ]);

    UINode::new("PaneControl", "Desktop 1")
        .with_class_name("#32769")
        .with_children([notes, ledger])
}

/// The ledger window's status text with a different progress value
pub fn desktop_with_progress(progress: &str) -> UINode {
    let mut root = sample_desktop();
    root.children[1].children[0].children[0].name = format!("Progress: {progress}");
    root
}

/// Engine wrapping a snapshot, whose nodes misbehave depending on their class name
pub struct FaultyEngine {
    inner: SnapshotEngine,
}

impl FaultyEngine {
    pub fn new(root: UINode) -> Self {
        Self {
            inner: SnapshotEngine::new(root),
        }
    }
}

impl AccessibilityEngine for FaultyEngine {
    fn get_root_element(&self) -> Result<UIElement, AutomationError> {
        Ok(FaultyElement::wrap(self.inner.get_root_element()?))
    }

    fn get_focused_element(&self) -> Result<UIElement, AutomationError> {
        Ok(FaultyElement::wrap(self.inner.get_focused_element()?))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[derive(Debug, Clone)]
pub struct FaultyElement {
    inner: UIElement,
}

impl FaultyElement {
    pub fn wrap(inner: UIElement) -> UIElement {
        UIElement::new(Box::new(FaultyElement { inner }))
    }

    fn has_class(&self, class: &str) -> bool {
        self.inner.class_name().map(|c| c == class).unwrap_or(false)
    }

    fn read<T>(
        &self,
        read: impl FnOnce(&UIElement) -> Result<T, AutomationError>,
    ) -> Result<T, AutomationError> {
        if self.has_class(BROKEN_CLASS) {
            return Err(AutomationError::ElementUnavailable(
                "provider went away".to_string(),
            ));
        }
        read(&self.inner)
    }
}

impl UIElementImpl for FaultyElement {
    fn object_id(&self) -> usize {
        self.inner.object_id()
    }

    fn automation_id(&self) -> Result<String, AutomationError> {
        self.read(UIElement::automation_id)
    }

    fn name(&self) -> Result<String, AutomationError> {
        self.read(UIElement::name)
    }

    fn class_name(&self) -> Result<String, AutomationError> {
        self.read(UIElement::class_name)
    }

    fn control_type(&self) -> Result<String, AutomationError> {
        self.read(UIElement::control_type)
    }

    fn process_id(&self) -> Result<u32, AutomationError> {
        self.read(UIElement::process_id)
    }

    fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        let children = self.read(UIElement::children)?;
        Ok(children.into_iter().map(FaultyElement::wrap).collect())
    }

    fn parent(&self) -> Result<Option<UIElement>, AutomationError> {
        Ok(self.read(UIElement::parent)?.map(FaultyElement::wrap))
    }

    fn is_available(&self) -> bool {
        !self.has_class(VANISHED_CLASS) && self.inner.is_available()
    }

    fn get_pattern(&self, kind: PatternKind) -> Result<PatternValue, AutomationError> {
        if self.has_class(PANICKING_CLASS) {
            panic!("provider crashed while answering {kind}");
        }
        self.read(|inner| inner.pattern_value(kind))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(self.clone())
    }
}

pub fn snapshot_engine(root: UINode) -> Arc<SnapshotEngine> {
    Arc::new(SnapshotEngine::new(root))
}
