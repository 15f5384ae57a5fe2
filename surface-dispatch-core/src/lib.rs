//! Core engine for surface-dispatch
//!
//! A backend streams a user interface as JSONL messages. This crate decodes
//! those lines, builds one component graph and one data model per surface,
//! resolves literal and bound values, and turns user gestures into actions
//! for the host to send back upstream.
//!
//! # Core Concepts
//!
//! - **Surface**: one UI instance with its own component graph and data model
//! - **Component graph**: nodes stored flat by id; children are ids in props
//! - **Data model**: a path-addressed tree of scalars and lists, merged not replaced
//! - **Bound value**: a literal, or a reference resolved against the data model on read
//! - **Action template**: data on a component, materialized into a [`UserAction`] on a gesture
//!
//! # Basic Example
//!
//! ```
//! use surface_dispatch_core::prelude::*;
//!
//! let mut engine = Engine::new();
//! engine.on_action(|action: UserAction| println!("{}", action.to_json_line()));
//!
//! engine.ingest_all(r#"
//! {"beginRendering": {"surfaceId": "s1", "root": "greeting"}}
//! {"surfaceUpdate": {"surfaceId": "s1", "components": [{"id": "greeting", "component": {"Text": {"text": {"path": "/name"}}}}]}}
//! {"dataModelUpdate": {"surfaceId": "s1", "contents": [{"key": "name", "valueString": "Ada"}]}}
//! "#);
//!
//! let tree = engine.render_tree("s1").unwrap();
//! let text = tree.root_node().unwrap();
//! assert_eq!(text.widget.get("text").and_then(DataValue::as_str), Some("Ada"));
//! ```
//!
//! # Host Loop
//!
//! With the `runtime` feature, [`runtime::spawn_line_reader`] reads any
//! `AsyncBufRead` on a task and forwards raw lines over a channel:
//!
//! ```ignore
//! let (line_tx, mut line_rx) = mpsc::unbounded_channel();
//! spawn_line_reader(BufReader::new(stdin()), line_tx, None, cancel.clone());
//!
//! loop {
//!     tokio::select! {
//!         Some(line) = line_rx.recv() => {
//!             if let IngestOutcome::Applied(outcome) = engine.ingest_bytes(&line) {
//!                 redraw(&engine.render_tree_with(&outcome.surface_id, &registry));
//!             }
//!         }
//!         // ... terminal input, calling engine.interact(...)
//!     }
//! }
//! ```

pub mod action;
pub mod catalog;
pub mod config;
pub mod data_model;
pub mod debug;
pub mod engine;
pub mod error;
pub mod graph;
pub mod middleware;
pub mod protocol;
pub mod render;
#[cfg(feature = "runtime")]
pub mod runtime;
pub mod surface;
pub mod testing;
pub mod value;

// Values and data model
pub use data_model::{DataEntry, DataModel, DataPath, EntryValue, SubscriptionId};
pub use value::{resolve, BoundValue, DataValue};

// Components
pub use catalog::{ChildShape, ComponentCatalog, ComponentSpec, ComponentTraits};
pub use graph::{ComponentGraph, ComponentNode, PropValue, Props};

// Actions
pub use action::{materialize, ActionOrigin, ActionSink, ActionTemplate, ContextEntry, UserAction};

// Protocol
pub use protocol::{decode_line, Decoder, Message, MessageKind};

// Engine
pub use config::EngineConfig;
pub use engine::{ApplyOutcome, Engine, IngestOutcome, IngestStats, Interaction};
pub use surface::{Surface, SurfaceState};

// Rendering
pub use render::{
    EmptyReason, RenderChild, RenderNode, RenderTree, ResolvedProps, WidgetContext, WidgetRegistry,
};

// Middleware
pub use middleware::{ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware};

// Errors
pub use error::{ConfigError, DecodeError, DecodeProblem, Fault, InteractionError};

#[cfg(feature = "runtime")]
pub use runtime::spawn_line_reader;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{ActionSink, ActionTemplate, UserAction};
    pub use crate::catalog::{ComponentCatalog, ComponentTraits};
    pub use crate::config::EngineConfig;
    pub use crate::data_model::{DataEntry, DataPath};
    pub use crate::debug::DebugState;
    pub use crate::engine::{ApplyOutcome, Engine, IngestOutcome, Interaction};
    pub use crate::error::{DecodeError, Fault, InteractionError};
    pub use crate::middleware::{LoggingMiddleware, Middleware};
    pub use crate::protocol::Message;
    pub use crate::render::{RenderChild, RenderNode, RenderTree, WidgetContext, WidgetRegistry};
    pub use crate::value::{BoundValue, DataValue};
}
