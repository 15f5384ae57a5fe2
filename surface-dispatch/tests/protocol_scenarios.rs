use std::sync::{Arc, Mutex};

use serde_json::json;
use surface_dispatch::debug::{MessageLogMiddleware, DECODE_ERROR};
use surface_dispatch::testing::{
    begin_rendering, component, data_model_update, surface_update, TestHarness,
};
use surface_dispatch::{
    assert_emitted, DataPath, DataValue, DecodeProblem, EmptyReason, Engine, Fault, IngestOutcome,
    Interaction, RenderChild, SurfaceState,
};

fn go_button() -> TestHarness {
    let mut harness = TestHarness::new();
    harness.ingest(&begin_rendering("s1", "c1"));
    harness.ingest(&surface_update(
        "s1",
        json!([component("c1", "Button", json!({
            "action": {"name": "go", "context": [{"key": "v", "value": {"path": "/x"}}]}
        }))]),
    ));
    harness
}

#[test]
fn test_scenario_a_unwritten_reference_uses_fallback() {
    let mut harness = go_button();
    harness.press("s1", "c1");

    let actions = harness.drain_emitted();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].name, "go");
    assert_eq!(actions[0].get("v"), Some(&DataValue::from("")));
}

#[test]
fn test_scenario_b_empty_key_writes_at_path() {
    let mut harness = go_button();
    harness.press("s1", "c1");
    harness.drain_emitted();

    harness.ingest(&data_model_update(
        "s1",
        "/x",
        json!([{"key": "", "valueString": "42"}]),
    ));
    assert_eq!(harness.engine.read("s1", "/x"), Some(&DataValue::from("42")));

    harness.press("s1", "c1");
    let actions = harness.drain_emitted();
    assert_emitted!(actions, "go");
    assert_eq!(actions[0].get("v"), Some(&DataValue::from("42")));
}

#[test]
fn test_scenario_c_checklist() {
    let mut harness = TestHarness::new();
    let stats = harness.ingest_all(
        &[
            begin_rendering("todo", "list"),
            surface_update(
                "todo",
                json!([
                    component("list", "Column", json!({"children": {"explicitList": ["ch5", "practice", "video"]}})),
                    component("ch5", "CheckBox", json!({"label": {"literalString": "Read chapter 5"}, "value": {"path": "/tasks/ch5"}})),
                    component("practice", "CheckBox", json!({"label": {"literalString": "Practice"}, "value": {"path": "/tasks/practice"}})),
                    component("video", "CheckBox", json!({"label": {"literalString": "Watch video"}, "value": {"path": "/tasks/video"}})),
                ]),
            ),
            data_model_update(
                "todo",
                "/tasks",
                json!([
                    {"key": "ch5", "valueBoolean": true},
                    {"key": "practice", "valueBoolean": false}
                ]),
            ),
        ]
        .join("\n"),
    );
    assert_eq!(stats.applied, 3);

    let engine = &harness.engine;
    assert_eq!(engine.read("todo", "/tasks/ch5"), Some(&DataValue::Bool(true)));
    assert_eq!(engine.read("todo", "/tasks/practice"), Some(&DataValue::Bool(false)));
    assert_eq!(engine.read("todo", "/tasks/video"), None);

    let tree = engine.render_tree("todo").unwrap();
    let video = tree.find("video").unwrap();
    assert_eq!(video.widget.get("value"), None);
    assert_eq!(video.widget.absent, vec!["value".to_string()]);
    assert_eq!(
        tree.affected_by(&[DataPath::parse("/tasks/video")]),
        vec!["video"]
    );
}

#[test]
fn test_batch_order_does_not_matter() {
    let entries = vec![
        component("root", "Column", json!({"children": {"explicitList": ["a", "b"]}})),
        component("a", "Text", json!({"text": {"literalString": "A"}})),
        component("b", "Text", json!({"text": {"path": "/b"}})),
    ];
    let mut reversed = entries.clone();
    reversed.reverse();

    let build = |components: Vec<serde_json::Value>| {
        let mut engine = Engine::new();
        engine.ingest(&surface_update("s", json!(components)));
        engine
    };
    let forward = build(entries);
    let backward = build(reversed);

    let forward_graph = forward.surface("s").unwrap().graph();
    let backward_graph = backward.surface("s").unwrap().graph();
    assert_eq!(forward_graph.len(), 3);
    for id in ["root", "a", "b"] {
        assert_eq!(forward_graph.get(id), backward_graph.get(id));
    }
}

#[test]
fn test_merge_keeps_siblings() {
    let mut engine = Engine::new();
    engine.ingest(&data_model_update("s", "/m", json!([{"key": "a", "valueNumber": 1}])));
    engine.ingest(&data_model_update("s", "/m", json!([{"key": "b", "valueNumber": 2}])));

    assert_eq!(engine.read("s", "/m/a"), Some(&DataValue::from(1)));
    assert_eq!(engine.read("s", "/m/b"), Some(&DataValue::from(2)));
    assert_eq!(
        engine.surface("s").unwrap().model().to_json(&DataPath::parse("/m")),
        Some(json!({"a": 1, "b": 2}))
    );
}

#[test]
fn test_resend_replaces_props() {
    let mut engine = Engine::new();
    engine.ingest(&begin_rendering("s", "t"));
    engine.ingest(&surface_update(
        "s",
        json!([component("t", "Text", json!({"text": {"literalString": "old"}, "usageHint": "h1"}))]),
    ));
    engine.ingest(&surface_update(
        "s",
        json!([component("t", "Text", json!({"text": {"literalString": "new"}}))]),
    ));

    let tree = engine.render_tree("s").unwrap();
    let text = tree.root_node().unwrap();
    assert_eq!(text.widget.get("text"), Some(&DataValue::from("new")));
    assert!(text.widget.raw.get("usageHint").is_none());
}

#[test]
fn test_forward_reference_fills_in_later() {
    let mut engine = Engine::new();
    engine.ingest(&begin_rendering("s", "card"));
    engine.ingest(&surface_update(
        "s",
        json!([component("card", "Card", json!({"child": "body"}))]),
    ));

    let tree = engine.render_tree("s").unwrap();
    assert_eq!(
        tree.root_node().unwrap().children,
        vec![RenderChild::Empty {
            id: "body".into(),
            reason: EmptyReason::Missing
        }]
    );

    engine.ingest(&surface_update(
        "s",
        json!([component("body", "Text", json!({"text": {"literalString": "hello"}}))]),
    ));
    let tree = engine.render_tree("s").unwrap();
    let body = tree.find("body").unwrap();
    assert_eq!(body.widget.get("text"), Some(&DataValue::from("hello")));
}

#[test]
fn test_malformed_lines_are_skipped() {
    let faults = Arc::new(Mutex::new(Vec::new()));
    let mut harness = go_button();
    let seen = faults.clone();
    harness
        .engine
        .on_fault(move |fault| seen.lock().unwrap().push(fault.clone()));

    let stats = harness.ingest_all(
        &[
            r#"{"dataModelUpdate": {"surfaceId": "s1", "path": "/", "contents": [{"key": "x", "valueString": "before"}]}}"#.to_string(),
            "{not json".to_string(),
            r#"{"surfaceUpdate": {"surfaceId": "s1"}}"#.to_string(),
            String::new(),
            r#"{"dataModelUpdate": {"surfaceId": "s1", "path": "/", "contents": [{"key": "y", "valueString": "after"}]}}"#.to_string(),
        ]
        .join("\n"),
    );

    assert_eq!(stats.applied, 2);
    assert_eq!(stats.blank, 1);
    assert_eq!(stats.skipped(), 2);
    assert!(matches!(stats.errors[0].problem, DecodeProblem::Json(_)));
    // Line numbers count every line the engine has seen, including setup.
    assert_eq!(stats.errors[0].line, 4);
    assert_eq!(stats.errors[1].line, 5);
    assert!(matches!(
        stats.errors[1].problem,
        DecodeProblem::InvalidField { kind: "surfaceUpdate", .. }
    ));
    assert_eq!(faults.lock().unwrap().len(), 2);

    assert_eq!(harness.engine.read("s1", "/x"), Some(&DataValue::from("before")));
    assert_eq!(harness.engine.read("s1", "/y"), Some(&DataValue::from("after")));
    harness.press("s1", "c1");
    assert_eq!(harness.drain_emitted()[0].get("v"), Some(&DataValue::from("before")));
}

#[test]
fn test_unknown_kind_is_ignored() {
    let mut engine = Engine::new();
    let outcome = engine.ingest(r#"{"deleteSurface": {"surfaceId": "s1"}}"#);
    assert_eq!(
        outcome,
        IngestOutcome::Ignored {
            kind: "deleteSurface".into()
        }
    );
    assert!(engine.surface_ids().is_empty());
}

#[test]
fn test_update_before_begin_creates_active_surface() {
    let mut engine = Engine::new();
    engine.ingest(&surface_update("late", json!([component("r", "Text", json!({}))])));
    assert_eq!(engine.surface_state("late"), SurfaceState::Active);
    assert!(engine.render_tree("late").unwrap().root.is_none());

    engine.ingest(&begin_rendering("late", "r"));
    assert!(engine.render_tree("late").unwrap().root_node().is_some());
    assert_eq!(engine.surface_state("never"), SurfaceState::Uninitialized);
}

#[test]
fn test_cycle_renders_empty_and_siblings_survive() {
    let faults = Arc::new(Mutex::new(Vec::new()));
    let mut engine = Engine::new();
    let seen = faults.clone();
    engine.on_fault(move |fault| seen.lock().unwrap().push(fault.clone()));

    engine.ingest(&begin_rendering("s", "root"));
    engine.ingest(&surface_update(
        "s",
        json!([
            component("root", "Column", json!({"children": {"explicitList": ["loop", "ok"]}})),
            component("loop", "Card", json!({"child": "root"})),
            component("ok", "Text", json!({"text": {"literalString": "fine"}})),
        ]),
    ));

    let tree = engine.render_tree("s").unwrap();
    let looped = tree.find("loop").unwrap();
    assert_eq!(
        looped.children,
        vec![RenderChild::Empty {
            id: "root".into(),
            reason: EmptyReason::Cycle
        }]
    );
    assert!(tree.find("ok").is_some());
    assert!(faults
        .lock()
        .unwrap()
        .iter()
        .any(|fault| matches!(fault, Fault::CyclicGraph { component_id, .. } if component_id == "root")));
}

#[test]
fn test_selection_written_before_action() {
    let mut harness = TestHarness::new();
    harness.ingest(&begin_rendering("s", "pick"));
    harness.ingest(&surface_update(
        "s",
        json!([component("pick", "MultipleChoice", json!({
            "selections": {"path": "/choice"},
            "action": {"name": "chosen", "context": [{"key": "picked", "value": {"path": "/choice"}}]}
        }))]),
    ));

    harness.interact("s", "pick", Interaction::Select(vec!["b".into(), "c".into()]));
    let actions = harness.drain_emitted();
    assert_eq!(actions[0].get("picked"), Some(&DataValue::from(vec!["b", "c"])));
}

#[test]
fn test_surfaces_are_independent() {
    let mut engine = Engine::new();
    engine.ingest(&data_model_update("a", "/", json!([{"key": "k", "valueString": "one"}])));
    engine.ingest(&data_model_update("b", "/", json!([{"key": "k", "valueString": "two"}])));

    assert_eq!(engine.read("a", "/k"), Some(&DataValue::from("one")));
    assert_eq!(engine.read("b", "/k"), Some(&DataValue::from("two")));
    assert_eq!(engine.surface_ids(), vec!["a", "b"]);

    assert!(engine.remove_surface("a").is_some());
    assert_eq!(engine.read("a", "/k"), None);
    assert_eq!(engine.read("b", "/k"), Some(&DataValue::from("two")));
}

#[test]
fn test_message_log_records_stream() {
    let mut engine = Engine::new().with_middleware(MessageLogMiddleware::with_default_log());
    engine.ingest(&begin_rendering("s", "r"));
    engine.ingest(&data_model_update("s", "/", json!([{"key": "k", "valueString": "v"}])));
    engine.ingest("oops");
    engine.ingest(r#"{"deleteSurface": {"surfaceId": "s"}}"#);

    let log = engine.middleware().log().unwrap();
    let kinds: Vec<&str> = log.entries().map(|entry| entry.kind.as_str()).collect();
    assert_eq!(
        kinds,
        vec!["beginRendering", "dataModelUpdate", DECODE_ERROR, "deleteSurface"]
    );
    let entries: Vec<_> = log.entries().collect();
    assert_eq!(entries[0].changed, Some(true));
    assert_eq!(entries[1].surface_id.as_deref(), Some("s"));
    assert_eq!(entries[3].changed, None);
}
