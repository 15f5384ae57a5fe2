//! Component type catalog
//!
//! Component types are open-ended strings. The catalog maps each known type
//! to a [`ComponentSpec`] describing where its children live, which prop a
//! user edit writes back to, and how it behaves. Types missing from the
//! catalog fall back to inference from their props, so a new widget type
//! works without touching the engine.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::data_model::DataPath;
use crate::graph::{ComponentNode, PropValue};
use crate::value::BoundValue;

bitflags! {
    /// Behavioural traits of a component type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ComponentTraits: u8 {
        /// Reacts to user gestures.
        const INTERACTIVE = 0b0001;
        /// Lays out child components.
        const CONTAINER = 0b0010;
        /// Writes user edits back to the data model.
        const BINDABLE = 0b0100;
        /// A selection change also fires the component's action.
        const AUTO_SUBMIT = 0b1000;
    }
}

/// Where a component type keeps its child ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildShape {
    /// No children.
    None,
    /// `{"explicitList": [...]}` under the named prop.
    List(String),
    /// A bare child id under the named prop.
    Single(String),
    /// Several single-id props, in the given order.
    Fields(Vec<String>),
    /// An array prop of objects, each holding a child id under `child`.
    Nested { list: String, child: String },
}

impl ChildShape {
    pub fn list(prop: &str) -> Self {
        Self::List(prop.to_string())
    }

    pub fn single(prop: &str) -> Self {
        Self::Single(prop.to_string())
    }

    pub fn fields(props: &[&str]) -> Self {
        Self::Fields(props.iter().map(|p| p.to_string()).collect())
    }

    pub fn nested(list: &str, child: &str) -> Self {
        Self::Nested {
            list: list.to_string(),
            child: child.to_string(),
        }
    }
}

/// Catalog entry for one component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    pub children: ChildShape,
    /// Prop written by edits, toggles and selections.
    pub binding: Option<String>,
    pub traits: ComponentTraits,
}

impl ComponentSpec {
    /// A display-only leaf.
    pub fn leaf() -> Self {
        Self {
            children: ChildShape::None,
            binding: None,
            traits: ComponentTraits::empty(),
        }
    }

    /// A layout container.
    pub fn container(children: ChildShape) -> Self {
        Self {
            children,
            binding: None,
            traits: ComponentTraits::CONTAINER,
        }
    }

    /// An input bound to the data model through `binding`.
    pub fn input(binding: &str) -> Self {
        Self {
            children: ChildShape::None,
            binding: Some(binding.to_string()),
            traits: ComponentTraits::INTERACTIVE | ComponentTraits::BINDABLE,
        }
    }

    pub fn with_children(mut self, children: ChildShape) -> Self {
        self.children = children;
        self
    }

    pub fn with_traits(mut self, traits: ComponentTraits) -> Self {
        self.traits |= traits;
        self
    }
}

/// Binding props tried, in order, for types missing from the catalog.
const INFERRED_BINDINGS: &[&str] = &["value", "text", "selections"];

/// Registry of known component types.
#[derive(Debug, Clone, Default)]
pub struct ComponentCatalog {
    specs: HashMap<String, ComponentSpec>,
}

impl ComponentCatalog {
    /// An empty catalog: every type is inferred.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard widget set.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for leaf in ["Text", "Heading", "Image", "Icon", "Divider", "Video", "AudioPlayer"] {
            catalog.register(leaf, ComponentSpec::leaf());
        }
        catalog
            .register(
                "Button",
                ComponentSpec::leaf()
                    .with_children(ChildShape::single("child"))
                    .with_traits(ComponentTraits::INTERACTIVE),
            )
            .register(
                "CheckBox",
                ComponentSpec::input("value").with_traits(ComponentTraits::AUTO_SUBMIT),
            )
            .register("TextField", ComponentSpec::input("text"))
            .register("DateTimeInput", ComponentSpec::input("value"))
            .register("Slider", ComponentSpec::input("value"))
            .register(
                "MultipleChoice",
                ComponentSpec::input("selections").with_traits(ComponentTraits::AUTO_SUBMIT),
            )
            .register("Row", ComponentSpec::container(ChildShape::list("children")))
            .register("Column", ComponentSpec::container(ChildShape::list("children")))
            .register("List", ComponentSpec::container(ChildShape::list("children")))
            .register("Card", ComponentSpec::container(ChildShape::single("child")))
            .register(
                "Tabs",
                ComponentSpec::container(ChildShape::nested("tabItems", "child")),
            )
            .register(
                "Modal",
                ComponentSpec::container(ChildShape::fields(&["entryPointChild", "contentChild"])),
            );
        catalog
    }

    /// Register or replace a type.
    pub fn register(&mut self, kind: impl Into<String>, spec: ComponentSpec) -> &mut Self {
        self.specs.insert(kind.into(), spec);
        self
    }

    pub fn get(&self, kind: &str) -> Option<&ComponentSpec> {
        self.specs.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.specs.contains_key(kind)
    }

    /// Registered type names, in no particular order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    /// Ordered child ids of `node`.
    ///
    /// Unknown types contribute every explicit list (in prop order) and then
    /// a bare `child` id if present.
    pub fn children_of<'a>(&self, node: &'a ComponentNode) -> Vec<&'a str> {
        let Some(spec) = self.get(&node.kind) else {
            let mut ids: Vec<&str> = node
                .props
                .iter()
                .filter_map(|(_, value)| match value {
                    PropValue::Children(ids) => Some(ids.iter().map(String::as_str)),
                    _ => None,
                })
                .flatten()
                .collect();
            ids.extend(node.props.raw_str("child"));
            return ids;
        };

        match &spec.children {
            ChildShape::None => Vec::new(),
            ChildShape::List(prop) => node
                .props
                .children(prop)
                .map(|ids| ids.iter().map(String::as_str).collect())
                .unwrap_or_default(),
            ChildShape::Single(prop) => node.props.raw_str(prop).into_iter().collect(),
            ChildShape::Fields(props) => props
                .iter()
                .filter_map(|prop| node.props.raw_str(prop))
                .collect(),
            ChildShape::Nested { list, child } => node
                .props
                .raw(list)
                .and_then(serde_json::Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get(child.as_str()))
                        .filter_map(serde_json::Value::as_str)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// The prop a user edit writes to, with its bound value.
    pub fn binding_of<'a>(&self, node: &'a ComponentNode) -> Option<(&'a str, &'a BoundValue)> {
        match self.get(&node.kind) {
            Some(spec) => {
                let prop = spec.binding.as_deref()?;
                node.props
                    .iter()
                    .find(|(name, _)| *name == prop)
                    .and_then(|(name, value)| match value {
                        PropValue::Bound(bound) => Some((name, bound)),
                        _ => None,
                    })
            }
            None => INFERRED_BINDINGS.iter().find_map(|prop| {
                node.props
                    .iter()
                    .find(|(name, _)| name == prop)
                    .and_then(|(name, value)| match value {
                        PropValue::Bound(bound @ BoundValue::Reference(_)) => Some((name, bound)),
                        _ => None,
                    })
            }),
        }
    }

    /// The data path a user edit writes to, if the binding is a reference.
    pub fn binding_path<'a>(&self, node: &'a ComponentNode) -> Option<&'a DataPath> {
        self.binding_of(node).and_then(|(_, bound)| bound.dependency())
    }

    /// Traits of `node`'s type; inferred from props for unknown types.
    pub fn traits_of(&self, node: &ComponentNode) -> ComponentTraits {
        if let Some(spec) = self.get(&node.kind) {
            return spec.traits;
        }
        let mut traits = ComponentTraits::empty();
        if node.props.action().is_some() {
            traits |= ComponentTraits::INTERACTIVE | ComponentTraits::AUTO_SUBMIT;
        }
        if self.binding_path(node).is_some() {
            traits |= ComponentTraits::INTERACTIVE | ComponentTraits::BINDABLE;
        }
        if !self.children_of(node).is_empty() {
            traits |= ComponentTraits::CONTAINER;
        }
        traits
    }
}
