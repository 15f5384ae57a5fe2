//! Widget registry and the render walk
//!
//! The host supplies a [`WidgetRegistry`] that turns a component type and
//! its resolved props into a visual instance of its own type `W`. The walk
//! starts at the surface's declared root and follows each node's child
//! shape, producing a [`RenderTree`] the host can draw.
//!
//! Faults never abort the walk:
//!
//! - a child id that has not arrived yet renders as an empty slot
//! - a type without a factory renders through the registry's placeholder
//! - a node that is its own ancestor renders empty, siblings are unaffected
//! - walks deeper than the depth limit, or longer than the node budget,
//!   are cut at that slot

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::action::ActionTemplate;
use crate::catalog::{ComponentCatalog, ComponentTraits};
use crate::config::EngineConfig;
use crate::data_model::{DataModel, DataPath};
use crate::error::Fault;
use crate::graph::{ComponentNode, PropValue, Props};
use crate::surface::Surface;
use crate::value::{BoundValue, DataValue};

/// Everything a widget factory may look at while building one widget.
#[derive(Clone, Copy)]
pub struct WidgetContext<'a> {
    surface_id: &'a str,
    node: &'a ComponentNode,
    model: &'a DataModel,
    catalog: &'a ComponentCatalog,
}

impl<'a> WidgetContext<'a> {
    pub fn new(
        surface_id: &'a str,
        node: &'a ComponentNode,
        model: &'a DataModel,
        catalog: &'a ComponentCatalog,
    ) -> Self {
        Self {
            surface_id,
            node,
            model,
            catalog,
        }
    }

    pub fn surface_id(&self) -> &'a str {
        self.surface_id
    }

    pub fn id(&self) -> &'a str {
        &self.node.id
    }

    pub fn kind(&self) -> &'a str {
        &self.node.kind
    }

    pub fn node(&self) -> &'a ComponentNode {
        self.node
    }

    pub fn props(&self) -> &'a Props {
        &self.node.props
    }

    pub fn model(&self) -> &'a DataModel {
        self.model
    }

    pub fn traits(&self) -> ComponentTraits {
        self.catalog.traits_of(self.node)
    }

    /// The resolved value of a bound prop, or `None` when the prop is not
    /// bound or its reference is absent.
    pub fn value(&self, prop: &str) -> Option<&'a DataValue> {
        self.node.props.bound(prop)?.resolve(self.model)
    }

    /// A bound prop as text. Absent resolves to `""`.
    pub fn text(&self, prop: &str) -> Cow<'a, str> {
        match self.node.props.bound(prop) {
            Some(bound) => bound.resolve_text(self.model),
            None => Cow::Borrowed(self.raw_str(prop).unwrap_or("")),
        }
    }

    /// A bound prop as a flag. Absent or non-boolean resolves to `false`.
    pub fn flag(&self, prop: &str) -> bool {
        self.node
            .props
            .bound(prop)
            .is_some_and(|bound| bound.resolve_bool(self.model))
    }

    /// A bound prop as a list. Absent or scalar resolves to empty.
    pub fn list(&self, prop: &str) -> &'a [DataValue] {
        self.node
            .props
            .bound(prop)
            .map(|bound| bound.resolve_list(self.model))
            .unwrap_or(&[])
    }

    pub fn raw(&self, prop: &str) -> Option<&'a Value> {
        self.node.props.raw(prop)
    }

    pub fn raw_str(&self, prop: &str) -> Option<&'a str> {
        self.node.props.raw_str(prop)
    }

    pub fn action(&self) -> Option<&'a ActionTemplate> {
        self.node.props.action()
    }

    /// The writable binding of this component, as `(prop, value)`.
    pub fn binding(&self) -> Option<(&'a str, &'a BoundValue)> {
        self.catalog.binding_of(self.node)
    }

    /// Current value behind the writable binding.
    pub fn bound_value(&self) -> Option<&'a DataValue> {
        self.binding()
            .and_then(|(_, bound)| bound.resolve(self.model))
    }

    /// Resolve a bound value found inside a raw prop, such as an option
    /// label `{"literalString": "..."}` inside a list of options.
    pub fn resolve_raw(&self, value: &Value) -> Option<DataValue> {
        let map = value.as_object()?;
        let bound = crate::protocol::decode_bound(map).ok()??;
        bound.resolve(self.model).cloned()
    }
}

type Factory<W> = Box<dyn Fn(&WidgetContext<'_>) -> W + Send + Sync>;

/// Type name to widget factory map, with a placeholder for unknown types.
pub struct WidgetRegistry<W> {
    factories: HashMap<String, Factory<W>>,
    placeholder: Factory<W>,
}

impl<W> std::fmt::Debug for WidgetRegistry<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("WidgetRegistry").field("kinds", &kinds).finish()
    }
}

impl<W> WidgetRegistry<W> {
    /// An empty registry. `placeholder` builds the inert widget shown for
    /// types with no factory.
    pub fn new(placeholder: impl Fn(&WidgetContext<'_>) -> W + Send + Sync + 'static) -> Self {
        Self {
            factories: HashMap::new(),
            placeholder: Box::new(placeholder),
        }
    }

    pub fn register(
        &mut self,
        kind: impl Into<String>,
        factory: impl Fn(&WidgetContext<'_>) -> W + Send + Sync + 'static,
    ) -> &mut Self {
        self.factories.insert(kind.into(), Box::new(factory));
        self
    }

    pub fn with(
        mut self,
        kind: impl Into<String>,
        factory: impl Fn(&WidgetContext<'_>) -> W + Send + Sync + 'static,
    ) -> Self {
        self.register(kind, factory);
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Build the widget for `ctx`. The flag is `true` when the placeholder
    /// was used.
    pub fn build(&self, ctx: &WidgetContext<'_>) -> (W, bool) {
        match self.factories.get(ctx.kind()) {
            Some(factory) => (factory(ctx), false),
            None => ((self.placeholder)(ctx), true),
        }
    }
}

/// Props of one node with every binding resolved. The widget type of the
/// engine's built-in registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedProps {
    /// Bound props that resolved to a value.
    pub values: BTreeMap<String, DataValue>,
    /// Bound props whose reference is absent.
    pub absent: Vec<String>,
    /// Name of the action template, if any.
    pub action: Option<String>,
    /// Props kept verbatim.
    pub raw: BTreeMap<String, Value>,
}

impl ResolvedProps {
    pub fn resolve(ctx: &WidgetContext<'_>) -> Self {
        let mut resolved = Self::default();
        for (name, prop) in ctx.props().iter() {
            match prop {
                PropValue::Bound(bound) => match bound.resolve(ctx.model()) {
                    Some(value) => {
                        resolved.values.insert(name.to_string(), value.clone());
                    }
                    None => resolved.absent.push(name.to_string()),
                },
                PropValue::Action(template) => resolved.action = Some(template.name.clone()),
                PropValue::Raw(value) => {
                    resolved.raw.insert(name.to_string(), value.clone());
                }
                PropValue::Children(_) => {}
            }
        }
        resolved
    }

    pub fn get(&self, prop: &str) -> Option<&DataValue> {
        self.values.get(prop)
    }

    /// A registry that resolves every type in `catalog`; anything else
    /// still resolves but is reported as a placeholder.
    pub fn registry(catalog: &ComponentCatalog) -> WidgetRegistry<Self> {
        let mut registry = WidgetRegistry::new(Self::resolve);
        for kind in catalog.kinds() {
            registry.register(kind, Self::resolve);
        }
        registry
    }
}

/// Why a child slot rendered nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmptyReason {
    /// The id has not been declared yet.
    Missing,
    /// The id is already on the path from the root.
    Cycle,
    /// The walk reached its depth limit.
    DepthLimit,
    /// The walk used up its node budget.
    Budget,
}

/// A drawn component.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode<W> {
    pub id: String,
    pub kind: String,
    pub widget: W,
    /// `true` when the type had no factory and `widget` is the placeholder.
    pub placeholder: bool,
    pub traits: ComponentTraits,
    pub weight: Option<f64>,
    /// Data paths this node's props read. A change at or above one of
    /// these means the node needs redrawing.
    pub bindings: Vec<DataPath>,
    pub children: Vec<RenderChild<W>>,
}

impl<W> RenderNode<W> {
    /// Child nodes that rendered, skipping empty slots.
    pub fn child_nodes(&self) -> impl Iterator<Item = &RenderNode<W>> {
        self.children.iter().filter_map(RenderChild::node)
    }

    /// Depth-first search for `id` in this subtree.
    pub fn find(&self, id: &str) -> Option<&RenderNode<W>> {
        if self.id == id {
            return Some(self);
        }
        self.child_nodes().find_map(|child| child.find(id))
    }

    /// Visit this subtree depth-first, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a RenderNode<W>, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a RenderNode<W>, usize)) {
        visit(self, depth);
        for child in self.child_nodes() {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Whether any binding of this node is affected by a change at `changed`.
    pub fn depends_on(&self, changed: &DataPath) -> bool {
        self.bindings
            .iter()
            .any(|path| changed.is_ancestor_or_equal(path))
    }
}

/// One child slot of a [`RenderNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderChild<W> {
    Node(RenderNode<W>),
    Empty { id: String, reason: EmptyReason },
}

impl<W> RenderChild<W> {
    pub fn node(&self) -> Option<&RenderNode<W>> {
        match self {
            Self::Node(node) => Some(node),
            Self::Empty { .. } => None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Node(node) => &node.id,
            Self::Empty { id, .. } => id,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }
}

/// The result of walking one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTree<W> {
    pub surface_id: String,
    /// `None` until the surface declares a root; an empty slot while the
    /// root component itself has not arrived.
    pub root: Option<RenderChild<W>>,
    /// Faults raised during the walk, in walk order.
    pub faults: Vec<Fault>,
}

impl<W> RenderTree<W> {
    pub fn root_node(&self) -> Option<&RenderNode<W>> {
        self.root.as_ref().and_then(RenderChild::node)
    }

    pub fn find(&self, id: &str) -> Option<&RenderNode<W>> {
        self.root_node().and_then(|root| root.find(id))
    }

    /// Every rendered node, depth-first.
    pub fn nodes(&self) -> Vec<&RenderNode<W>> {
        let mut nodes = Vec::new();
        if let Some(root) = self.root_node() {
            root.walk(&mut |node, _| nodes.push(node));
        }
        nodes
    }

    /// Ids of nodes whose bindings are affected by any of `changed`.
    pub fn affected_by(&self, changed: &[DataPath]) -> Vec<&str> {
        self.nodes()
            .into_iter()
            .filter(|node| changed.iter().any(|path| node.depends_on(path)))
            .map(|node| node.id.as_str())
            .collect()
    }
}

/// Walk `surface` from its root through `registry`.
pub fn render_surface<W>(
    surface: &Surface,
    catalog: &ComponentCatalog,
    registry: &WidgetRegistry<W>,
    config: &EngineConfig,
) -> RenderTree<W> {
    let mut walker = Walker {
        surface,
        catalog,
        registry,
        max_depth: config.max_render_depth,
        budget: config.max_render_nodes,
        ancestors: Vec::new(),
        faults: Vec::new(),
    };
    let root = surface.root().map(|root| walker.visit(root, 0));
    RenderTree {
        surface_id: surface.id().to_string(),
        root,
        faults: walker.faults,
    }
}

struct Walker<'a, W> {
    surface: &'a Surface,
    catalog: &'a ComponentCatalog,
    registry: &'a WidgetRegistry<W>,
    max_depth: usize,
    budget: usize,
    /// Ids on the path from the root to the node being visited.
    ancestors: Vec<&'a str>,
    faults: Vec<Fault>,
}

impl<'a, W> Walker<'a, W> {
    fn empty(id: &str, reason: EmptyReason) -> RenderChild<W> {
        RenderChild::Empty {
            id: id.to_string(),
            reason,
        }
    }

    fn visit(&mut self, id: &'a str, depth: usize) -> RenderChild<W> {
        let surface_id = self.surface.id();

        let Some(node) = self.surface.graph().get(id) else {
            tracing::debug!(surface_id, component_id = id, "child not declared yet");
            return Self::empty(id, EmptyReason::Missing);
        };
        if self.ancestors.contains(&id) {
            tracing::warn!(surface_id, component_id = id, "cycle in component graph");
            self.faults.push(Fault::CyclicGraph {
                surface_id: surface_id.to_string(),
                component_id: id.to_string(),
            });
            return Self::empty(id, EmptyReason::Cycle);
        }
        if depth >= self.max_depth {
            tracing::warn!(surface_id, component_id = id, limit = self.max_depth, "render depth limit");
            self.faults.push(Fault::DepthLimit {
                surface_id: surface_id.to_string(),
                component_id: id.to_string(),
                limit: self.max_depth,
            });
            return Self::empty(id, EmptyReason::DepthLimit);
        }
        if self.budget == 0 {
            tracing::debug!(surface_id, component_id = id, "render node budget exhausted");
            return Self::empty(id, EmptyReason::Budget);
        }
        self.budget -= 1;

        let ctx = WidgetContext::new(surface_id, node, self.surface.model(), self.catalog);
        let (widget, placeholder) = self.registry.build(&ctx);
        if placeholder {
            tracing::warn!(surface_id, component_id = id, kind = %node.kind, "unknown component type");
            self.faults.push(Fault::UnknownComponentType {
                surface_id: surface_id.to_string(),
                component_id: id.to_string(),
                kind: node.kind.clone(),
            });
        }

        self.ancestors.push(id);
        let children = self
            .catalog
            .children_of(node)
            .into_iter()
            .map(|child| self.visit(child, depth + 1))
            .collect();
        self.ancestors.pop();

        RenderChild::Node(RenderNode {
            id: node.id.clone(),
            kind: node.kind.clone(),
            widget,
            placeholder,
            traits: self.catalog.traits_of(node),
            weight: node.weight,
            bindings: node.props.dependencies().into_iter().cloned().collect(),
            children,
        })
    }
}
