//! Terminal widgets for surface-dispatch
//!
//! Draws the render trees produced by `surface-dispatch-core` with
//! ratatui, and turns key presses into engine interactions.
//!
//! - [`tui_registry`] - a `WidgetRegistry<TuiWidget>` for the standard catalog
//! - [`SurfaceView`] - lays out a tree, tracks focus, reports [`WidgetEvent`]s
//! - [`TextInput`] - single-line text entry used by `TextField`
//! - [`spawn_event_poller`] - crossterm input on a tokio task
//!
//! # Example
//!
//! ```ignore
//! use surface_dispatch_widgets::prelude::*;
//!
//! let registry = tui_registry();
//! let mut view = SurfaceView::new();
//!
//! let tree = engine.render_tree_with("s1", &registry).unwrap();
//! terminal.draw(|frame| {
//!     let area = frame.area();
//!     view.render(frame, area, SurfaceViewProps { tree: &tree });
//! })?;
//!
//! for event in view.handle_event(&event, SurfaceViewProps { tree: &tree }) {
//!     engine.interact(&event.surface_id, &event.component_id, event.interaction)?;
//! }
//! ```

pub mod component;
pub mod event;
pub mod keys;
mod text_input;
pub mod testing;
mod view;
mod widget;

pub use component::Component;
pub use event::{process_raw_event, spawn_event_poller, EventKind, RawEvent};
pub use keys::parse_key_string;
pub use text_input::{TextEdit, TextInput, TextInputProps};
pub use view::{SurfaceView, SurfaceViewProps, WidgetEvent};
pub use widget::{tui_registry, Axis, ChoiceOption, TextHint, TuiWidget};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        tui_registry, Component, EventKind, SurfaceView, SurfaceViewProps, TuiWidget, WidgetEvent,
    };
}
