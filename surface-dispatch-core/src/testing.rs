//! Test utilities for hosts of the engine
//!
//! - Line builders ([`begin_rendering`], [`surface_update`],
//!   [`data_model_update`], [`component`]) that produce protocol lines
//! - [`TestHarness`]: an engine wired to an action channel
//! - Assertion macros over emitted [`UserAction`]s
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use surface_dispatch_core::assert_emitted;
//! use surface_dispatch_core::testing::{begin_rendering, component, surface_update, TestHarness};
//!
//! let mut harness = TestHarness::new();
//! harness.ingest(&begin_rendering("s1", "ok"));
//! harness.ingest(&surface_update("s1", json!([
//!     component("ok", "Button", json!({"action": {"name": "confirm"}})),
//! ])));
//!
//! harness.press("s1", "ok");
//! let actions = harness.drain_emitted();
//! assert_emitted!(actions, "confirm");
//! ```

use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::action::UserAction;
use crate::engine::{Engine, IngestOutcome, IngestStats, Interaction};
use crate::error::InteractionError;
use crate::middleware::Middleware;

/// A `beginRendering` line.
pub fn begin_rendering(surface_id: &str, root: &str) -> String {
    json!({"beginRendering": {"surfaceId": surface_id, "root": root}}).to_string()
}

/// A `surfaceUpdate` line. `components` is the JSON array of entries.
pub fn surface_update(surface_id: &str, components: Value) -> String {
    json!({"surfaceUpdate": {"surfaceId": surface_id, "components": components}}).to_string()
}

/// A `dataModelUpdate` line. `contents` is the JSON array of entries.
pub fn data_model_update(surface_id: &str, path: &str, contents: Value) -> String {
    json!({"dataModelUpdate": {"surfaceId": surface_id, "path": path, "contents": contents}})
        .to_string()
}

/// One component entry for [`surface_update`].
pub fn component(id: &str, kind: &str, props: Value) -> Value {
    json!({"id": id, "component": {kind: props}})
}

/// An engine whose emitted actions land in a channel the test can drain.
pub struct TestHarness<M: Middleware = crate::middleware::NoopMiddleware> {
    pub engine: Engine<M>,
    rx: mpsc::UnboundedReceiver<UserAction>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_engine(Engine::new())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Middleware> TestHarness<M> {
    /// Wrap an existing engine. Replaces its action sink.
    pub fn with_engine(mut engine: Engine<M>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        engine.on_action(tx);
        Self { engine, rx }
    }

    pub fn ingest(&mut self, line: &str) -> IngestOutcome {
        self.engine.ingest(line)
    }

    pub fn ingest_all(&mut self, text: &str) -> IngestStats {
        self.engine.ingest_all(text)
    }

    /// Apply a gesture. Panics on host misuse, since tests set up the
    /// surface themselves.
    pub fn interact(&mut self, surface_id: &str, component_id: &str, interaction: Interaction) {
        if let Err(err) = self.try_interact(surface_id, component_id, interaction) {
            panic!("interaction on `{component_id}` failed: {err}");
        }
    }

    pub fn try_interact(
        &mut self,
        surface_id: &str,
        component_id: &str,
        interaction: Interaction,
    ) -> Result<Option<UserAction>, InteractionError> {
        self.engine.interact(surface_id, component_id, interaction)
    }

    pub fn press(&mut self, surface_id: &str, component_id: &str) {
        self.interact(surface_id, component_id, Interaction::Press);
    }

    /// Drain all emitted actions.
    pub fn drain_emitted(&mut self) -> Vec<UserAction> {
        let mut actions = Vec::new();
        while let Ok(action) = self.rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    pub fn has_emitted(&mut self) -> bool {
        !self.drain_emitted().is_empty()
    }
}

/// Assert that an action was emitted, by name or by pattern.
///
/// ```ignore
/// assert_emitted!(actions, "go");
/// assert_emitted!(actions, UserAction { name, .. } if name.starts_with("submit"));
/// ```
#[macro_export]
macro_rules! assert_emitted {
    ($actions:expr, $name:literal) => {
        assert!(
            $actions.iter().any(|a| a.name == $name),
            "Expected action `{}` to be emitted, but got: {:?}",
            $name,
            $actions
        );
    };
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` to be emitted, but got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Assert that no matching action was emitted.
#[macro_export]
macro_rules! assert_not_emitted {
    ($actions:expr, $name:literal) => {
        assert!(
            !$actions.iter().any(|a| a.name == $name),
            "Expected action `{}` NOT to be emitted, but it was: {:?}",
            $name,
            $actions
        );
    };
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` NOT to be emitted, but it was: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// The first matching action, if any.
#[macro_export]
macro_rules! find_emitted {
    ($actions:expr, $name:literal) => {
        $actions.iter().find(|a| a.name == $name)
    };
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().find(|a| matches!(a, $pattern $(if $guard)?))
    };
}

/// How many actions match.
#[macro_export]
macro_rules! count_emitted {
    ($actions:expr, $name:literal) => {
        $actions.iter().filter(|a| a.name == $name).count()
    };
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().filter(|a| matches!(a, $pattern $(if $guard)?)).count()
    };
}
