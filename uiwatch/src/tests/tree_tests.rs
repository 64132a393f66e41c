use super::{init_tracing, sample_desktop, snapshot_engine, FaultyEngine, BROKEN_CLASS, LEDGER_PID};
use crate::platforms::{AccessibilityEngine, SnapshotEngine, TreeBuildConfig};
use crate::{AutomationError, Desktop, LocatorDescriptor, UINode};
use std::io::Write;
use std::sync::Arc;

fn desktop() -> Desktop {
    Desktop::with_engine(snapshot_engine(sample_desktop()))
}

#[test]
fn test_capture_focused_and_resolve_again() {
    init_tracing();
    let desktop = desktop();
    let locator = desktop.capture_focused(20).unwrap();

    assert_eq!(locator.automation_id(), "txtAmount");
    assert_eq!(locator.control_type(), "EditControl");
    assert_eq!(locator.process_id(), Some(LEDGER_PID));
    let names: Vec<&str> = locator.path().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Desktop 1", "Billing - Ledger", "Amount"]);

    assert_eq!(desktop.read_value(&locator).as_deref(), Some("1,250.75"));
}

#[test]
fn test_capture_stops_at_depth_limit() {
    let desktop = desktop();
    let focused = desktop.focused_element().unwrap();
    let locator = LocatorDescriptor::capture(&focused, 2);
    let names: Vec<&str> = locator.path().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Billing - Ledger", "Amount"]);
}

#[test]
fn test_dump_whole_tree() {
    let tree = desktop().dump_tree(None, &TreeBuildConfig::default()).unwrap();
    assert_eq!(tree.count(), sample_desktop().count());
    assert_eq!(tree.name, "Desktop 1");

    let amount = &tree.children[1].children[1];
    assert_eq!(amount.automation_id, "txtAmount");
    assert!(amount.is_focused);
    assert_eq!(amount.patterns.value.as_deref(), Some("1,250.75"));
    assert!(!tree.children[1].is_focused);
}

#[test]
fn test_dump_process_window_with_depth_limit() {
    let config = TreeBuildConfig {
        max_depth: Some(1),
        ..TreeBuildConfig::default()
    };
    let tree = desktop().dump_tree(Some(LEDGER_PID), &config).unwrap();
    assert_eq!(tree.name, "Billing - Ledger");
    assert_eq!(tree.children.len(), 4);
    assert!(tree.children.iter().all(|child| child.children.is_empty()));

    let missing = desktop().dump_tree(Some(1), &config);
    assert!(matches!(missing, Err(AutomationError::ElementNotFound(_))));
}

#[test]
fn test_dump_keeps_unreadable_nodes_without_children() {
    let mut root = sample_desktop();
    root.children[1].children[0].class_name = BROKEN_CLASS.to_string();
    let desktop = Desktop::with_engine(Arc::new(FaultyEngine::new(root)));

    let tree = desktop.dump_tree(None, &TreeBuildConfig::default()).unwrap();
    let pane = &tree.children[1].children[0];
    assert_eq!(pane.control_type, "");
    assert!(pane.children.is_empty());
    assert_eq!(tree.children[1].children.len(), 4);
}

#[test]
fn test_snapshot_json_round_trip() {
    let tree = desktop().dump_tree(None, &TreeBuildConfig::default()).unwrap();
    let json = serde_json::to_string_pretty(&tree).unwrap();
    // Empty properties are left out
    assert!(!json.contains(r#""name": """#));
    assert!(!json.contains(r#""is_focused": false"#));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    let engine = SnapshotEngine::from_file(file.path()).unwrap();
    let desktop = Desktop::with_engine(Arc::new(engine));

    let locator = LocatorDescriptor::builder()
        .automation_id("chkPaid")
        .process_id(LEDGER_PID)
        .build();
    assert_eq!(desktop.read_value(&locator).as_deref(), Some("1"));
}

#[test]
fn test_elements_go_stale_when_tree_is_replaced() {
    let engine = snapshot_engine(sample_desktop());
    let root = engine.get_root_element().unwrap();
    assert!(root.is_available());

    engine.update(UINode::new("PaneControl", "Desktop 2"));
    assert!(!root.is_available());
    assert_eq!(root.name().unwrap(), "Desktop 1");
    assert_eq!(engine.get_root_element().unwrap().name().unwrap(), "Desktop 2");
}

#[test]
fn test_debug_output_is_an_indented_outline() {
    let output = format!("{:?}", sample_desktop());
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "PaneControl \"Desktop 1\" .#32769");
    assert_eq!(lines[1], "  WindowControl \"Notes\" .NotesMain pid=5151");
    assert!(lines.contains(&"    EditControl \"Amount\" #txtAmount .Edit pid=4242 focused"));
    assert_eq!(lines.len(), sample_desktop().count());
}

#[test]
fn test_debug_output_summarizes_deep_subtrees() {
    let mut node = UINode::new("PaneControl", "leaf");
    for depth in 0..120 {
        node = UINode::new("PaneControl", format!("level {depth}")).with_child(node);
    }
    let output = format!("{node:?}");
    assert!(output.ends_with("(57 more nodes)"));
    assert!(!output.contains("\"leaf\""));
}
