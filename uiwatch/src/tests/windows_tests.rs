use super::init_tracing;
use crate::platforms::TreeBuildConfig;
use crate::Desktop;

#[test]
#[ignore] // Needs an interactive desktop session
fn test_live_root_and_dump() {
    init_tracing();
    let desktop = Desktop::new().expect("UI Automation available");
    let root = desktop.root().unwrap();
    assert!(root.is_available());
    assert_eq!(root.control_type().unwrap(), "PaneControl");

    let config = TreeBuildConfig {
        max_depth: Some(1),
        ..TreeBuildConfig::default()
    };
    let tree = desktop.dump_tree(None, &config).unwrap();
    assert!(!tree.children.is_empty());
}

#[test]
#[ignore] // Needs an interactive desktop session with a focused element
fn test_live_capture_resolves_to_same_element() {
    init_tracing();
    let desktop = Desktop::new().expect("UI Automation available");
    let focused = desktop.focused_element().unwrap();
    let locator = desktop.capture_focused(20).unwrap();
    assert!(!locator.path().is_empty());

    let resolved = desktop.resolve(&locator).expect("captured element resolves");
    assert_eq!(resolved, focused);
}
