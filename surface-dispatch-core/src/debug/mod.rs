//! Debug and inspection utilities
//!
//! - [`DebugState`]: expose engine state as key/value sections for a host
//!   debug panel. [`Surface`](crate::Surface) implements it.
//! - [`MessageLogMiddleware`]: glob-filtered tracing of ingested messages,
//!   with an optional in-memory ring buffer of recent summaries.
//!
//! # State Inspection
//!
//! ```
//! use surface_dispatch_core::debug::DebugState;
//! use surface_dispatch_core::Engine;
//!
//! let mut engine = Engine::new();
//! engine.ingest(r#"{"beginRendering": {"surfaceId": "s1", "root": "c1"}}"#);
//! engine.ingest(r#"{"dataModelUpdate": {"surfaceId": "s1", "path": "/form", "contents": [{"key": "name", "valueString": "Ada"}]}}"#);
//!
//! let sections = engine.surface("s1").unwrap().debug_sections();
//! assert_eq!(sections[0].get("root"), Some("c1"));
//! assert_eq!(sections[1].get("/form/name"), Some("Ada"));
//! ```

pub mod message_log;
mod state;

pub use message_log::{
    glob_match, MessageLog, MessageLogConfig, MessageLogEntry, MessageLogFilter,
    MessageLogMiddleware, DECODE_ERROR,
};
pub use state::{DebugEntry, DebugSection, DebugState};
