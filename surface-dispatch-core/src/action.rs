//! Action templates, user actions and the sinks that carry them upstream
//!
//! An [`ActionTemplate`] is data attached to an interactive component. It
//! only becomes a [`UserAction`] when the user triggers it: every context
//! value is resolved against the data model at that moment, so the emitted
//! action reflects the store exactly as it was when the gesture happened.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::data_model::DataModel;
use crate::value::{BoundValue, DataValue};

/// One `key -> value` pair of an action template.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    pub key: String,
    pub value: BoundValue,
}

impl ContextEntry {
    pub fn new(key: impl Into<String>, value: BoundValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// The declarative description of an action, as authored on a component.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTemplate {
    pub name: String,
    pub context: Vec<ContextEntry>,
}

impl ActionTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: BoundValue) -> Self {
        self.context.push(ContextEntry::new(key, value));
        self
    }
}

/// A resolved context entry of a [`UserAction`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEntry {
    pub key: String,
    pub value: DataValue,
}

/// A fully literal action produced by a user gesture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    pub name: String,
    pub surface_id: String,
    pub source_component_id: String,
    pub context: Vec<ResolvedEntry>,
}

impl UserAction {
    /// Resolved value for a context key.
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.context
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    /// The upstream envelope `{"userAction": {...}}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "userAction": self })
    }

    /// The upstream envelope as a single JSONL line (no trailing newline).
    pub fn to_json_line(&self) -> String {
        self.to_json().to_string()
    }
}

/// Where a materialized action came from.
#[derive(Debug, Clone, Copy)]
pub struct ActionOrigin<'a> {
    pub surface_id: &'a str,
    pub component_id: &'a str,
}

/// Resolve every context value of `template` against `model`.
///
/// References with nothing behind them resolve to `fallback`.
pub fn materialize(
    template: &ActionTemplate,
    model: &DataModel,
    origin: ActionOrigin<'_>,
    fallback: &DataValue,
) -> UserAction {
    let context = template
        .context
        .iter()
        .map(|entry| ResolvedEntry {
            key: entry.key.clone(),
            value: entry.value.resolve_or(model, fallback).clone(),
        })
        .collect();

    UserAction {
        name: template.name.clone(),
        surface_id: origin.surface_id.to_string(),
        source_component_id: origin.component_id.to_string(),
        context,
    }
}

/// Receives user actions for upstream delivery.
///
/// Emission is fire-and-forget: the engine never waits on the sink and
/// ignores delivery failures beyond logging them.
pub trait ActionSink {
    fn emit(&mut self, action: UserAction);
}

impl<F> ActionSink for F
where
    F: FnMut(UserAction),
{
    fn emit(&mut self, action: UserAction) {
        self(action)
    }
}

impl ActionSink for mpsc::UnboundedSender<UserAction> {
    fn emit(&mut self, action: UserAction) {
        if let Err(err) = self.send(action) {
            tracing::warn!(action = %err.0.name, "action channel closed, dropping action");
        }
    }
}
