//! surface-dispatch: streamed declarative UI surfaces
//!
//! A backend describes a user interface as a stream of JSONL messages.
//! The engine merges them into live per-surface component graphs and data
//! models, resolves bound values on read, and turns user gestures into
//! fully resolved actions for the host to send back.
//!
//! # Example
//! ```
//! use surface_dispatch::prelude::*;
//!
//! let mut engine = Engine::new();
//! engine.ingest(r#"{"beginRendering": {"surfaceId": "s1", "root": "ok"}}"#);
//! engine.ingest(r#"{"surfaceUpdate": {"surfaceId": "s1", "components": [{"id": "ok", "component": {"Button": {"action": {"name": "confirm"}}}}]}}"#);
//!
//! let action = engine.interact("s1", "ok", Interaction::Press).unwrap().unwrap();
//! let envelope = action.to_json();
//! assert_eq!(envelope["userAction"]["name"], "confirm");
//! assert_eq!(envelope["userAction"]["sourceComponentId"], "ok");
//! ```

// Re-export everything from core
pub use surface_dispatch_core::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use surface_dispatch_core::prelude::*;

    // Host seams
    pub use surface_dispatch_core::{
        ComposedMiddleware, IngestStats, NoopMiddleware, ResolvedProps, SurfaceState,
    };

    // Debug
    pub use surface_dispatch_core::debug::{MessageLogConfig, MessageLogFilter, MessageLogMiddleware};

    #[cfg(feature = "runtime")]
    pub use surface_dispatch_core::spawn_line_reader;
}
