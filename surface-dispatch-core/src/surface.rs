//! One independently addressable UI instance

use std::fmt;

use serde_json::Value;

use crate::data_model::DataModel;
use crate::debug::{DebugSection, DebugState};
use crate::graph::ComponentGraph;

/// Lifecycle of a surface.
///
/// There is no closed state: teardown is the host dropping the surface via
/// [`Engine::remove_surface`](crate::Engine::remove_surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceState {
    /// Not yet seen by the engine.
    #[default]
    Uninitialized,
    /// Receiving updates. A surface created by an update before its
    /// `beginRendering` is active but has no root yet.
    Active,
}

impl fmt::Display for SurfaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
        })
    }
}

/// A surface: its component graph, its data model and its style hints.
#[derive(Debug)]
pub struct Surface {
    id: String,
    state: SurfaceState,
    graph: ComponentGraph,
    model: DataModel,
    styles: Option<Value>,
}

impl Surface {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: SurfaceState::Active,
            graph: ComponentGraph::new(),
            model: DataModel::new(),
            styles: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// The declared root component id, once `beginRendering` arrived.
    pub fn root(&self) -> Option<&str> {
        self.graph.root()
    }

    pub fn graph(&self) -> &ComponentGraph {
        &self.graph
    }

    pub fn model(&self) -> &DataModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut DataModel {
        &mut self.model
    }

    /// Style hints from `beginRendering`, passed through untouched.
    pub fn styles(&self) -> Option<&Value> {
        self.styles.as_ref()
    }

    pub(crate) fn graph_mut(&mut self) -> &mut ComponentGraph {
        &mut self.graph
    }

    pub(crate) fn set_styles(&mut self, styles: Option<Value>) {
        if styles.is_some() {
            self.styles = styles;
        }
    }

    /// Borrow the graph and the data model at once.
    pub fn parts_mut(&mut self) -> (&ComponentGraph, &mut DataModel) {
        (&self.graph, &mut self.model)
    }
}

impl DebugState for Surface {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let surface = DebugSection::new("Surface")
            .entry("id", &self.id)
            .entry("state", self.state.to_string())
            .entry("root", self.root().unwrap_or("-"))
            .entry("components", self.graph.len().to_string());

        let mut model = DebugSection::new("Data Model");
        for (path, value) in self.model.flatten() {
            model.push_entry(path.to_string(), value.to_string());
        }

        vec![surface, model]
    }
}
