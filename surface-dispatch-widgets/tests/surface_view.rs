use serde_json::json;
use surface_dispatch_core::testing::{
    begin_rendering, component, data_model_update, surface_update, TestHarness,
};
use surface_dispatch_core::{DataValue, Interaction, WidgetRegistry};
use surface_dispatch_widgets::keys::key;
use surface_dispatch_widgets::prelude::*;

fn signup() -> TestHarness {
    let mut harness = TestHarness::new();
    harness.ingest(&begin_rendering("form", "root"));
    harness.ingest(&surface_update(
        "form",
        json!([
            component("root", "Column", json!({"children": {"explicitList": ["title", "name", "agree", "size", "send"]}})),
            component("title", "Text", json!({"text": {"literalString": "Sign up"}, "usageHint": "h1"})),
            component("name", "TextField", json!({"label": {"literalString": "Name"}, "text": {"path": "/form/name"}})),
            component("agree", "CheckBox", json!({"label": {"literalString": "Agree"}, "value": {"path": "/form/agree"}})),
            component("size", "MultipleChoice", json!({
                "selections": {"path": "/form/size"},
                "maxAllowedSelections": 1,
                "options": [
                    {"label": {"literalString": "Small"}, "value": "s"},
                    {"label": {"literalString": "Large"}, "value": "l"}
                ]
            })),
            component("send", "Button", json!({
                "child": "send_label",
                "action": {"name": "submit", "context": [
                    {"key": "name", "value": {"path": "/form/name"}},
                    {"key": "agree", "value": {"path": "/form/agree"}},
                    {"key": "size", "value": {"path": "/form/size"}}
                ]}
            })),
            component("send_label", "Text", json!({"text": {"literalString": "Send"}})),
        ]),
    ));
    harness.ingest(&data_model_update(
        "form",
        "/form",
        json!([{"key": "name", "valueString": "Ada"}]),
    ));
    harness
}

/// Feed one key through the view and apply what it reports.
fn press(
    harness: &mut TestHarness,
    view: &mut SurfaceView,
    registry: &WidgetRegistry<TuiWidget>,
    k: &str,
) -> Vec<WidgetEvent> {
    let tree = harness.engine.render_tree_with("form", registry).unwrap();
    let events: Vec<WidgetEvent> = view
        .handle_event(&EventKind::Key(key(k)), SurfaceViewProps { tree: &tree })
        .into_iter()
        .collect();
    for event in &events {
        harness.interact(&event.surface_id, &event.component_id, event.interaction.clone());
    }
    events
}

#[test]
fn test_draws_form() {
    let harness = signup();
    let tree = harness.engine.render_tree_with("form", &tui_registry()).unwrap();
    let lines = SurfaceView::new().render_to_lines(&tree, 30, 10).unwrap();

    assert_eq!(lines[0], "Sign up");
    assert!(lines[1].contains("Name"));
    assert!(lines[2].contains("Ada"));
    assert_eq!(lines[4], "[ ] Agree");
    assert_eq!(lines[5], "( ) Small");
    assert_eq!(lines[6], "( ) Large");
    assert_eq!(lines[7], "[ Send ]");
}

#[test]
fn test_keyboard_drives_engine() {
    let mut harness = signup();
    let registry = tui_registry();
    let mut view = SurfaceView::new();

    press(&mut harness, &mut view, &registry, "end");
    let events = press(&mut harness, &mut view, &registry, "!");
    assert_eq!(events[0].component_id, "name");
    assert_eq!(events[0].interaction, Interaction::Edit(DataValue::from("Ada!")));
    assert_eq!(harness.engine.read("form", "/form/name"), Some(&DataValue::from("Ada!")));

    press(&mut harness, &mut view, &registry, "tab");
    press(&mut harness, &mut view, &registry, "space");
    assert_eq!(harness.engine.read("form", "/form/agree"), Some(&DataValue::Bool(true)));

    press(&mut harness, &mut view, &registry, "tab");
    press(&mut harness, &mut view, &registry, "down");
    let events = press(&mut harness, &mut view, &registry, "enter");
    assert_eq!(events[0].interaction, Interaction::Select(vec!["l".into()]));
    assert!(harness.drain_emitted().is_empty());

    press(&mut harness, &mut view, &registry, "tab");
    assert_eq!(view.focused(), Some("send"));
    press(&mut harness, &mut view, &registry, "enter");

    let actions = harness.drain_emitted();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].name, "submit");
    assert_eq!(actions[0].get("name"), Some(&DataValue::from("Ada!")));
    assert_eq!(actions[0].get("agree"), Some(&DataValue::Bool(true)));
    assert_eq!(actions[0].get("size"), Some(&DataValue::from(vec!["l"])));
}

#[test]
fn test_focus_wraps_both_ways() {
    let mut harness = signup();
    let registry = tui_registry();
    let mut view = SurfaceView::new();

    press(&mut harness, &mut view, &registry, "shift+tab");
    assert_eq!(view.focused(), Some("send"));
    press(&mut harness, &mut view, &registry, "tab");
    assert_eq!(view.focused(), Some("name"));
}

#[test]
fn test_tabs_switch_visible_content() {
    let mut harness = TestHarness::new();
    harness.ingest(&begin_rendering("t", "tabs"));
    harness.ingest(&surface_update(
        "t",
        json!([
            component("tabs", "Tabs", json!({"tabItems": [
                {"title": {"literalString": "One"}, "child": "first"},
                {"title": {"literalString": "Two"}, "child": "second"}
            ]})),
            component("first", "Text", json!({"text": {"literalString": "first page"}})),
            component("second", "Button", json!({"child": "label", "action": {"name": "go"}})),
            component("label", "Text", json!({"text": {"literalString": "Go"}})),
        ]),
    ));
    let registry = tui_registry();
    let tree = harness.engine.render_tree_with("t", &registry).unwrap();
    let mut view = SurfaceView::new();

    assert_eq!(view.focusable(&tree), vec!["tabs"]);
    let lines = view.render_to_lines(&tree, 20, 3).unwrap();
    assert!(lines[0].contains("One"));
    assert_eq!(lines[1], "first page");

    let events: Vec<_> = view
        .handle_event(&EventKind::Key(key("right")), SurfaceViewProps { tree: &tree })
        .into_iter()
        .collect();
    assert!(events.is_empty());
    assert_eq!(view.focusable(&tree), vec!["tabs", "second"]);
    let lines = view.render_to_lines(&tree, 20, 3).unwrap();
    assert_eq!(lines[1], "[ Go ]");
}

#[test]
fn test_row_splits_width() {
    let mut harness = TestHarness::new();
    harness.ingest(&begin_rendering("r", "row"));
    harness.ingest(&surface_update(
        "r",
        json!([
            component("row", "Row", json!({"children": {"explicitList": ["l", "r"]}})),
            component("l", "Text", json!({"text": {"literalString": "L"}})),
            component("r", "Text", json!({"text": {"literalString": "R"}})),
        ]),
    ));
    let tree = harness.engine.render_tree_with("r", &tui_registry()).unwrap();
    let lines = SurfaceView::new().render_to_lines(&tree, 21, 1).unwrap();
    assert!(lines[0].starts_with('L'));
    assert!(lines[0].ends_with('R'));
}

#[test]
fn test_waiting_states() {
    let mut harness = TestHarness::new();
    harness.ingest(&surface_update("w", json!([component("a", "Text", json!({}))])));
    let registry = tui_registry();
    let tree = harness.engine.render_tree_with("w", &registry).unwrap();
    let lines = SurfaceView::new().render_to_lines(&tree, 40, 1).unwrap();
    assert_eq!(lines[0], "waiting for beginRendering...");

    harness.ingest(&begin_rendering("w", "missing"));
    let tree = harness.engine.render_tree_with("w", &registry).unwrap();
    let lines = SurfaceView::new().render_to_lines(&tree, 40, 1).unwrap();
    assert_eq!(lines[0], "waiting for `missing`...");
}

#[test]
fn test_unknown_type_draws_placeholder_and_children() {
    let mut harness = TestHarness::new();
    harness.ingest(&begin_rendering("u", "chart"));
    harness.ingest(&surface_update(
        "u",
        json!([
            component("chart", "Chart", json!({"child": "caption"})),
            component("caption", "Text", json!({"text": {"literalString": "sales"}})),
        ]),
    ));
    let tree = harness.engine.render_tree_with("u", &tui_registry()).unwrap();
    let lines = SurfaceView::new().render_to_lines(&tree, 20, 2).unwrap();
    assert_eq!(lines, vec!["<Chart>".to_string(), "sales".to_string()]);
}
