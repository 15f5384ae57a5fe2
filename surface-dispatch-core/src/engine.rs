//! The surface coordinator
//!
//! [`Engine`] owns every surface, feeds protocol lines through the decoder
//! and applies each message to its surface as one step. Hosts read surfaces
//! back through [`Engine::render_tree`] and [`Engine::read`], and drive user
//! gestures in through [`Engine::interact`].

use std::collections::HashMap;
use std::io::BufRead;

use crate::action::{materialize, ActionOrigin, ActionSink, UserAction};
use crate::catalog::{ComponentCatalog, ComponentTraits};
use crate::config::EngineConfig;
use crate::data_model::{DataEntry, DataPath, SubscriptionId};
use crate::error::{DecodeError, Fault, InteractionError};
use crate::graph::ComponentNode;
use crate::middleware::{Middleware, NoopMiddleware};
use crate::protocol::{Decoder, Message, MessageKind};
use crate::render::{render_surface, RenderTree, ResolvedProps, WidgetRegistry};
use crate::surface::{Surface, SurfaceState};
use crate::value::DataValue;

/// What one applied message changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub surface_id: String,
    pub kind: MessageKind,
    /// The message created the surface.
    pub created_surface: bool,
    pub root_changed: bool,
    /// Ids inserted or replaced, in message order.
    pub changed_components: Vec<String>,
    /// Data paths written, one per merged entry.
    pub changed_paths: Vec<DataPath>,
}

impl ApplyOutcome {
    pub fn new(surface_id: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            surface_id: surface_id.into(),
            kind,
            created_surface: false,
            root_changed: false,
            changed_components: Vec::new(),
            changed_paths: Vec::new(),
        }
    }

    pub fn changed(&self) -> bool {
        self.created_surface
            || self.root_changed
            || !self.changed_components.is_empty()
            || !self.changed_paths.is_empty()
    }
}

/// Result of feeding one line to [`Engine::ingest`].
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Applied(ApplyOutcome),
    /// A well-formed message of a kind this engine does not handle.
    Ignored { kind: String },
    /// Whitespace only.
    Blank,
    /// The line failed to decode and was skipped.
    Skipped(DecodeError),
}

impl IngestOutcome {
    pub fn applied(&self) -> Option<&ApplyOutcome> {
        match self {
            Self::Applied(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DecodeError> {
        match self {
            Self::Skipped(err) => Some(err),
            _ => None,
        }
    }
}

/// Tally of a multi-line ingest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestStats {
    pub applied: usize,
    pub ignored: usize,
    pub blank: usize,
    pub errors: Vec<DecodeError>,
}

impl IngestStats {
    fn record(&mut self, outcome: IngestOutcome) {
        match outcome {
            IngestOutcome::Applied(_) => self.applied += 1,
            IngestOutcome::Ignored { .. } => self.ignored += 1,
            IngestOutcome::Blank => self.blank += 1,
            IngestOutcome::Skipped(err) => self.errors.push(err),
        }
    }

    pub fn skipped(&self) -> usize {
        self.errors.len()
    }
}

/// A user gesture on a component.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// Trigger the component's action.
    Press,
    /// Write a new value to the component's binding. Never emits.
    Edit(DataValue),
    /// Set a boolean binding, then auto-submit if the type does.
    Toggle(bool),
    /// Set a selection binding, then auto-submit if the type does.
    Select(Vec<String>),
}

type FaultHook = Box<dyn Fn(&Fault) + Send + Sync>;

/// The protocol engine.
///
/// Single-threaded and synchronous: every call runs to completion, and a
/// message is fully applied before the next line is read.
///
/// ```
/// use surface_dispatch_core::{Engine, Interaction};
///
/// let mut engine = Engine::new();
/// engine.ingest(r#"{"beginRendering": {"surfaceId": "s1", "root": "b"}}"#);
/// engine.ingest(r#"{"surfaceUpdate": {"surfaceId": "s1", "components": [{"id": "b", "component": {"Button": {"action": {"name": "go", "context": [{"key": "v", "value": {"path": "/x"}}]}}}}]}}"#);
///
/// let action = engine.interact("s1", "b", Interaction::Press).unwrap().unwrap();
/// assert_eq!(action.name, "go");
/// assert_eq!(action.get("v").unwrap().as_str(), Some(""));
/// ```
pub struct Engine<M: Middleware = NoopMiddleware> {
    surfaces: HashMap<String, Surface>,
    decoder: Decoder,
    catalog: ComponentCatalog,
    resolved: WidgetRegistry<ResolvedProps>,
    config: EngineConfig,
    middleware: M,
    sink: Option<Box<dyn ActionSink + Send>>,
    fault_hook: Option<FaultHook>,
}

impl<M: Middleware + std::fmt::Debug> std::fmt::Debug for Engine<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("surfaces", &self.surface_ids())
            .field("config", &self.config)
            .field("middleware", &self.middleware)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with the standard catalog and default config.
    pub fn new() -> Self {
        let catalog = ComponentCatalog::standard();
        let config = EngineConfig::default();
        Self {
            surfaces: HashMap::new(),
            decoder: Decoder::new(config.max_line_bytes),
            resolved: ResolvedProps::registry(&catalog),
            catalog,
            config,
            middleware: NoopMiddleware,
            sink: None,
            fault_hook: None,
        }
    }
}

impl<M: Middleware> Engine<M> {
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.decoder = Decoder::new(config.max_line_bytes);
        self.config = config;
        self
    }

    pub fn with_catalog(mut self, catalog: ComponentCatalog) -> Self {
        self.resolved = ResolvedProps::registry(&catalog);
        self.catalog = catalog;
        self
    }

    /// Swap the middleware, keeping everything else.
    pub fn with_middleware<N: Middleware>(self, middleware: N) -> Engine<N> {
        Engine {
            surfaces: self.surfaces,
            decoder: self.decoder,
            catalog: self.catalog,
            resolved: self.resolved,
            config: self.config,
            middleware,
            sink: self.sink,
            fault_hook: self.fault_hook,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    pub fn middleware_mut(&mut self) -> &mut M {
        &mut self.middleware
    }

    /// Register the host's action callback. Replaces any previous sink.
    pub fn on_action(&mut self, sink: impl ActionSink + Send + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Register a callback for every non-fatal fault: decode faults while
    /// ingesting and render faults while walking.
    pub fn on_fault(&mut self, hook: impl Fn(&Fault) + Send + Sync + 'static) {
        self.fault_hook = Some(Box::new(hook));
    }

    fn report(&self, fault: Fault) {
        if let Some(hook) = &self.fault_hook {
            hook(&fault);
        }
    }

    // ========================================================================
    // Ingest
    // ========================================================================

    /// Decode and apply one protocol line. Never panics: a bad line is
    /// reported and skipped.
    pub fn ingest(&mut self, line: &str) -> IngestOutcome {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            self.decoder.skip_line();
            return IngestOutcome::Blank;
        }
        let decoded = self.decoder.decode(line);
        self.finish_ingest(decoded)
    }

    /// Like [`ingest`](Self::ingest) for a line read as raw bytes. A line
    /// that is not UTF-8 is skipped with [`DecodeProblem::InvalidUtf8`].
    ///
    /// [`DecodeProblem::InvalidUtf8`]: crate::DecodeProblem::InvalidUtf8
    pub fn ingest_bytes(&mut self, line: &[u8]) -> IngestOutcome {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        match std::str::from_utf8(line) {
            Ok(text) => self.ingest(text),
            Err(_) => {
                let decoded = self.decoder.decode_bytes(line);
                self.finish_ingest(decoded)
            }
        }
    }

    fn finish_ingest(&mut self, decoded: Result<Message, DecodeError>) -> IngestOutcome {
        match decoded {
            Ok(message) => match self.apply(&message) {
                Some(outcome) => IngestOutcome::Applied(outcome),
                None => IngestOutcome::Ignored {
                    kind: message.name().to_string(),
                },
            },
            Err(err) => {
                tracing::warn!(line = err.line, error = %err, "skipping malformed line");
                self.middleware.on_decode_error(&err);
                self.report(Fault::Decode(err.clone()));
                IngestOutcome::Skipped(err)
            }
        }
    }

    /// Ingest every line of `text`.
    pub fn ingest_all(&mut self, text: &str) -> IngestStats {
        let mut stats = IngestStats::default();
        for line in text.lines() {
            stats.record(self.ingest(line));
        }
        stats
    }

    /// Ingest lines from a reader until EOF. Lines are split on raw bytes,
    /// so a line that is not UTF-8 is skipped like any other bad line. Only
    /// I/O errors stop the read.
    pub fn ingest_reader(&mut self, mut reader: impl BufRead) -> std::io::Result<IngestStats> {
        let mut stats = IngestStats::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            stats.record(self.ingest_bytes(&buf));
        }
        Ok(stats)
    }

    /// Apply an already decoded message. Returns `None` for unrecognized
    /// kinds.
    pub fn apply(&mut self, message: &Message) -> Option<ApplyOutcome> {
        self.middleware.before(message);
        let outcome = match message {
            Message::BeginRendering(begin) => {
                let outcome = self.declare_root(&begin.surface_id, &begin.root);
                if let Some(surface) = self.surfaces.get_mut(&begin.surface_id) {
                    surface.set_styles(begin.styles.clone());
                }
                Some(outcome)
            }
            Message::SurfaceUpdate(update) => {
                Some(self.apply_update(&update.surface_id, update.components.clone()))
            }
            Message::DataModelUpdate(update) => {
                Some(self.merge(&update.surface_id, &update.path, update.contents.clone()))
            }
            Message::Unrecognized { kind } => {
                tracing::debug!(kind = %kind, "ignoring unrecognized message kind");
                None
            }
        };
        self.middleware.after(message, outcome.as_ref());
        outcome
    }

    fn surface_entry(&mut self, surface_id: &str) -> (&mut Surface, bool) {
        let created = !self.surfaces.contains_key(surface_id);
        if created {
            tracing::info!(surface_id, "surface created");
        }
        let surface = self
            .surfaces
            .entry(surface_id.to_string())
            .or_insert_with(|| Surface::new(surface_id));
        (surface, created)
    }

    /// Set the render entry point of a surface, creating it if needed.
    pub fn declare_root(&mut self, surface_id: &str, root: &str) -> ApplyOutcome {
        let (surface, created) = self.surface_entry(surface_id);
        let root_changed = surface.graph_mut().declare_root(root);
        ApplyOutcome {
            created_surface: created,
            root_changed,
            ..ApplyOutcome::new(surface_id, MessageKind::BeginRendering)
        }
    }

    /// Insert or replace components by id. Creates the surface without a
    /// root if it is unknown.
    pub fn apply_update(&mut self, surface_id: &str, nodes: Vec<ComponentNode>) -> ApplyOutcome {
        let (surface, created) = self.surface_entry(surface_id);
        let changed_components = surface.graph_mut().apply_update(nodes);
        tracing::debug!(surface_id, count = changed_components.len(), "components updated");
        ApplyOutcome {
            created_surface: created,
            changed_components,
            ..ApplyOutcome::new(surface_id, MessageKind::SurfaceUpdate)
        }
    }

    /// Merge entries into a surface's data model at `path`. Creates the
    /// surface without a root if it is unknown.
    pub fn merge(&mut self, surface_id: &str, path: &DataPath, entries: Vec<DataEntry>) -> ApplyOutcome {
        let changed_paths = entries.iter().map(|entry| path.join(&entry.key)).collect();
        let (surface, created) = self.surface_entry(surface_id);
        surface.model_mut().merge(path, entries);
        ApplyOutcome {
            created_surface: created,
            changed_paths,
            ..ApplyOutcome::new(surface_id, MessageKind::DataModelUpdate)
        }
    }

    // ========================================================================
    // Surfaces
    // ========================================================================

    pub fn surface(&self, surface_id: &str) -> Option<&Surface> {
        self.surfaces.get(surface_id)
    }

    pub fn surface_mut(&mut self, surface_id: &str) -> Option<&mut Surface> {
        self.surfaces.get_mut(surface_id)
    }

    pub fn surface_state(&self, surface_id: &str) -> SurfaceState {
        self.surfaces
            .get(surface_id)
            .map_or(SurfaceState::Uninitialized, Surface::state)
    }

    /// Known surface ids, sorted.
    pub fn surface_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.surfaces.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Discard a surface and everything it holds.
    pub fn remove_surface(&mut self, surface_id: &str) -> Option<Surface> {
        let removed = self.surfaces.remove(surface_id);
        if removed.is_some() {
            tracing::info!(surface_id, "surface removed");
        }
        removed
    }

    // ========================================================================
    // Data model
    // ========================================================================

    /// The value at `path` in a surface's data model. `None` for unknown
    /// surfaces and absent paths alike.
    pub fn read(&self, surface_id: &str, path: &str) -> Option<&DataValue> {
        self.surfaces
            .get(surface_id)?
            .model()
            .read(&DataPath::parse(path))
    }

    /// Write a single value at `path`.
    pub fn write(
        &mut self,
        surface_id: &str,
        path: &str,
        value: impl Into<DataValue>,
    ) -> Result<(), InteractionError> {
        let surface = self
            .surfaces
            .get_mut(surface_id)
            .ok_or_else(|| InteractionError::UnknownSurface(surface_id.to_string()))?;
        surface.model_mut().write(&DataPath::parse(path), value.into());
        Ok(())
    }

    /// Listen for writes at or above `path` in a surface's data model.
    pub fn subscribe(
        &mut self,
        surface_id: &str,
        path: &str,
        listener: impl FnMut(&DataPath) + Send + 'static,
    ) -> Result<SubscriptionId, InteractionError> {
        let surface = self
            .surfaces
            .get_mut(surface_id)
            .ok_or_else(|| InteractionError::UnknownSurface(surface_id.to_string()))?;
        Ok(surface.model_mut().subscribe(DataPath::parse(path), listener))
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Walk a surface with the built-in registry, which resolves every
    /// prop. `None` for unknown surfaces.
    pub fn render_tree(&self, surface_id: &str) -> Option<RenderTree<ResolvedProps>> {
        self.render_tree_with(surface_id, &self.resolved)
    }

    /// Walk a surface with a host registry.
    pub fn render_tree_with<W>(
        &self,
        surface_id: &str,
        registry: &WidgetRegistry<W>,
    ) -> Option<RenderTree<W>> {
        let surface = self.surfaces.get(surface_id)?;
        let tree = render_surface(surface, &self.catalog, registry, &self.config);
        for fault in &tree.faults {
            self.report(fault.clone());
        }
        Some(tree)
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    /// Apply a user gesture to a component.
    ///
    /// Writes happen before the action is materialized, so an auto-submitted
    /// action sees the value just written. The action, if any, is handed to
    /// the registered sink and also returned.
    pub fn interact(
        &mut self,
        surface_id: &str,
        component_id: &str,
        interaction: Interaction,
    ) -> Result<Option<UserAction>, InteractionError> {
        let catalog = &self.catalog;
        let fallback = &self.config.action_fallback;
        let surface = self
            .surfaces
            .get_mut(surface_id)
            .ok_or_else(|| InteractionError::UnknownSurface(surface_id.to_string()))?;
        let (graph, model) = surface.parts_mut();
        let node = graph
            .get(component_id)
            .ok_or_else(|| InteractionError::UnknownComponent {
                surface_id: surface_id.to_string(),
                component_id: component_id.to_string(),
            })?;

        let auto_submit = match interaction {
            Interaction::Press => {
                if node.props.action().is_none() {
                    return Err(InteractionError::NoAction(component_id.to_string()));
                }
                true
            }
            Interaction::Edit(value) => {
                model.write(writable_path(catalog, node)?, value);
                false
            }
            Interaction::Toggle(on) => {
                model.write(writable_path(catalog, node)?, DataValue::Bool(on));
                catalog.traits_of(node).contains(ComponentTraits::AUTO_SUBMIT)
            }
            Interaction::Select(selections) => {
                model.write(writable_path(catalog, node)?, DataValue::from(selections));
                catalog.traits_of(node).contains(ComponentTraits::AUTO_SUBMIT)
            }
        };

        let action = match node.props.action() {
            Some(template) if auto_submit => {
                let origin = ActionOrigin {
                    surface_id,
                    component_id,
                };
                materialize(template, model, origin, fallback)
            }
            _ => return Ok(None),
        };

        tracing::debug!(surface_id, component_id, action = %action.name, "user action");
        if let Some(sink) = self.sink.as_mut() {
            sink.emit(action.clone());
        }
        Ok(Some(action))
    }

    /// Press a component and return the action it produced.
    pub fn invoke(&mut self, surface_id: &str, component_id: &str) -> Result<UserAction, InteractionError> {
        self.interact(surface_id, component_id, Interaction::Press)?
            .ok_or_else(|| InteractionError::NoAction(component_id.to_string()))
    }
}

fn writable_path<'a>(
    catalog: &ComponentCatalog,
    node: &'a ComponentNode,
) -> Result<&'a DataPath, InteractionError> {
    catalog
        .binding_path(node)
        .ok_or_else(|| InteractionError::NotBound(node.id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeProblem;
    use crate::testing::{begin_rendering, data_model_update, surface_update};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn checkbox_surface() -> Engine {
        let mut engine = Engine::new();
        engine.ingest(&begin_rendering("s1", "cb"));
        engine.ingest(&surface_update(
            "s1",
            json!([{"id": "cb", "component": {"CheckBox": {
                "label": {"literalString": "Chapter 5"},
                "value": {"path": "/tasks/ch5"},
                "action": {"name": "check", "context": [{"key": "done", "value": {"path": "/tasks/ch5"}}]}
            }}}]),
        ));
        engine
    }

    #[test]
    fn test_unknown_surface_is_uninitialized() {
        let engine = Engine::new();
        assert_eq!(engine.surface_state("nope"), SurfaceState::Uninitialized);
        assert!(engine.render_tree("nope").is_none());
        assert_eq!(engine.read("nope", "/x"), None);
    }

    #[test]
    fn test_begin_rendering_creates_active_surface() {
        let mut engine = Engine::new();
        let outcome = engine.ingest(&begin_rendering("s1", "c1"));
        let applied = outcome.applied().unwrap();
        assert!(applied.created_surface);
        assert!(applied.root_changed);
        assert_eq!(engine.surface_state("s1"), SurfaceState::Active);
        assert_eq!(engine.surface("s1").unwrap().root(), Some("c1"));

        let again = engine.ingest(&begin_rendering("s1", "c1"));
        assert!(!again.applied().unwrap().changed());
    }

    #[test]
    fn test_update_before_begin_creates_rootless_surface() {
        let mut engine = Engine::new();
        let outcome = engine.ingest(&data_model_update("s2", "/a", json!([{"key": "b", "valueNumber": 1}])));
        assert!(outcome.applied().unwrap().created_surface);
        assert_eq!(engine.surface_state("s2"), SurfaceState::Active);
        assert!(engine.render_tree("s2").unwrap().root.is_none());

        engine.ingest(&begin_rendering("s2", "r"));
        assert_eq!(engine.surface("s2").unwrap().root(), Some("r"));
        assert_eq!(engine.read("s2", "/a/b"), Some(&DataValue::from(1i64)));
    }

    #[test]
    fn test_changed_paths_reported() {
        let mut engine = Engine::new();
        let outcome = engine.ingest(&data_model_update(
            "s1",
            "/form",
            json!([{"key": "name", "valueString": "Ada"}, {"key": "", "valueString": "x"}]),
        ));
        assert_eq!(
            outcome.applied().unwrap().changed_paths,
            vec![DataPath::parse("/form/name"), DataPath::parse("/form")]
        );
    }

    #[test]
    fn test_keyed_entry_after_empty_key_survives() {
        let mut engine = Engine::new();
        let outcome = engine.ingest(&data_model_update(
            "s1",
            "/x",
            json!([{"key": "", "valueString": "seed"}, {"key": "a", "valueString": "later"}]),
        ));
        assert_eq!(
            outcome.applied().unwrap().changed_paths,
            vec![DataPath::parse("/x"), DataPath::parse("/x/a")]
        );
        assert_eq!(engine.read("s1", "/x/a"), Some(&DataValue::from("later")));
        assert_eq!(engine.read("s1", "/x"), None);
    }

    #[test]
    fn test_blank_and_bad_lines() {
        let faults = Arc::new(Mutex::new(Vec::new()));
        let mut engine = Engine::new();
        let seen = faults.clone();
        engine.on_fault(move |fault| seen.lock().unwrap().push(fault.clone()));

        assert_eq!(engine.ingest("   \r\n"), IngestOutcome::Blank);
        let outcome = engine.ingest("{broken");
        let err = outcome.error().unwrap();
        assert_eq!(err.line, 2);
        assert_eq!(faults.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unrecognized_kind_ignored() {
        let mut engine = Engine::new();
        assert_eq!(
            engine.ingest(r#"{"deleteSurface": {"surfaceId": "s1"}}"#),
            IngestOutcome::Ignored {
                kind: "deleteSurface".into()
            }
        );
        assert!(engine.surface_ids().is_empty());
    }

    #[test]
    fn test_toggle_writes_before_auto_submit() {
        let mut engine = checkbox_surface();
        let action = engine
            .interact("s1", "cb", Interaction::Toggle(true))
            .unwrap()
            .unwrap();
        assert_eq!(action.get("done"), Some(&DataValue::Bool(true)));
        assert_eq!(engine.read("s1", "/tasks/ch5"), Some(&DataValue::Bool(true)));
    }

    #[test]
    fn test_edit_never_emits() {
        let mut engine = checkbox_surface();
        let emitted = Arc::new(Mutex::new(Vec::new()));
        let sink = emitted.clone();
        engine.on_action(move |action: UserAction| sink.lock().unwrap().push(action));

        let result = engine.interact("s1", "cb", Interaction::Edit(DataValue::Bool(true)));
        assert_eq!(result, Ok(None));
        assert!(emitted.lock().unwrap().is_empty());

        engine.invoke("s1", "cb").unwrap();
        assert_eq!(emitted.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_interaction_errors() {
        let mut engine = checkbox_surface();
        engine.ingest(&surface_update(
            "s1",
            json!([
                {"id": "t", "component": {"Text": {"text": {"literalString": "hi"}}}},
                {"id": "f", "component": {"TextField": {"text": {"literalString": "fixed"}}}}
            ]),
        ));

        assert_eq!(
            engine.invoke("s2", "cb"),
            Err(InteractionError::UnknownSurface("s2".into()))
        );
        assert!(matches!(
            engine.invoke("s1", "zz"),
            Err(InteractionError::UnknownComponent { .. })
        ));
        assert_eq!(engine.invoke("s1", "t"), Err(InteractionError::NoAction("t".into())));
        assert_eq!(
            engine.interact("s1", "f", Interaction::Edit("x".into())),
            Err(InteractionError::NotBound("f".into()))
        );
    }

    #[test]
    fn test_action_fallback_from_config() {
        let mut engine = Engine::new().with_config(EngineConfig::default().with_action_fallback("n/a"));
        engine.ingest(&begin_rendering("s1", "b"));
        engine.ingest(&surface_update(
            "s1",
            json!([{"id": "b", "component": {"Button": {"action": {"name": "go", "context": [
                {"key": "v", "value": {"path": "/x"}}
            ]}}}}]),
        ));
        let action = engine.invoke("s1", "b").unwrap();
        assert_eq!(action.get("v"), Some(&DataValue::from("n/a")));
    }

    #[test]
    fn test_remove_surface() {
        let mut engine = checkbox_surface();
        assert!(engine.remove_surface("s1").is_some());
        assert_eq!(engine.surface_state("s1"), SurfaceState::Uninitialized);
        assert!(engine.remove_surface("s1").is_none());
    }

    #[test]
    fn test_render_faults_reach_hook() {
        let count = Arc::new(Mutex::new(0usize));
        let mut engine = Engine::new();
        let seen = count.clone();
        engine.on_fault(move |_| *seen.lock().unwrap() += 1);
        engine.ingest(&begin_rendering("s1", "x"));
        engine.ingest(&surface_update("s1", json!([{"id": "x", "component": {"Sparkle": {}}}])));

        let tree = engine.render_tree("s1").unwrap();
        assert!(tree.root_node().unwrap().placeholder);
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_subscribe_and_write() {
        let mut engine = checkbox_surface();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = hits.clone();
        engine
            .subscribe("s1", "/tasks/ch5", move |path| sink.lock().unwrap().push(path.to_string()))
            .unwrap();
        engine.write("s1", "/tasks", DataValue::from("ignored-by-child")).unwrap();
        engine.interact("s1", "cb", Interaction::Toggle(false)).unwrap();
        assert_eq!(*hits.lock().unwrap(), vec!["/tasks", "/tasks/ch5"]);
    }

    #[test]
    fn test_ingest_reader_counts() {
        let mut engine = Engine::new();
        let text = format!(
            "{}\n\nnot json\n{}\n",
            begin_rendering("s1", "r"),
            r#"{"futureKind": {}}"#
        );
        let stats = engine.ingest_reader(std::io::Cursor::new(text)).unwrap();
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.blank, 1);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.skipped(), 1);
        assert_eq!(stats.errors[0].line, 3);
    }

    #[test]
    fn test_ingest_reader_skips_non_utf8_line() {
        let faults = Arc::new(Mutex::new(Vec::new()));
        let mut engine = Engine::new();
        let seen = faults.clone();
        engine.on_fault(move |fault| seen.lock().unwrap().push(fault.clone()));

        let mut bytes = data_model_update("s1", "/", json!([{"key": "a", "valueString": "before"}])).into_bytes();
        bytes.extend_from_slice(b"\n\xff\xfe garbage\r\n");
        bytes.extend_from_slice(data_model_update("s1", "/", json!([{"key": "b", "valueString": "after"}])).as_bytes());

        let stats = engine.ingest_reader(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(stats.applied, 2);
        assert_eq!(stats.skipped(), 1);
        assert_eq!(stats.errors[0].line, 2);
        assert_eq!(stats.errors[0].problem, DecodeProblem::InvalidUtf8);
        assert_eq!(faults.lock().unwrap().len(), 1);
        assert_eq!(engine.read("s1", "/a"), Some(&DataValue::from("before")));
        assert_eq!(engine.read("s1", "/b"), Some(&DataValue::from("after")));
    }

    #[test]
    fn test_ingest_bytes_strips_terminator() {
        let mut engine = Engine::new();
        assert_eq!(engine.ingest_bytes(b"\r\n"), IngestOutcome::Blank);
        let line = format!("{}\r\n", begin_rendering("s1", "r"));
        assert!(engine.ingest_bytes(line.as_bytes()).applied().is_some());
    }
}
