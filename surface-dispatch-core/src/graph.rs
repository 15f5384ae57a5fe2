//! Component nodes and the per-surface component graph
//!
//! Components are stored flat, by id. Parent/child structure lives in the
//! props (an explicit list of ids, or a single id field), so a parent may
//! name a child that has not arrived yet. Re-sending an id replaces the
//! whole node.

use std::collections::{BTreeMap, HashMap};

use crate::action::ActionTemplate;
use crate::catalog::ComponentCatalog;
use crate::data_model::DataPath;
use crate::value::BoundValue;

/// A decoded prop.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// `{"literal<Kind>": ...}` or `{"path": "/a/b"}`
    Bound(BoundValue),
    /// `{"explicitList": [id, ...]}`
    Children(Vec<String>),
    /// `{"name": ..., "context": [...]}` under the `action` key
    Action(ActionTemplate),
    /// Anything else, kept verbatim (single child ids, hints, option lists).
    Raw(serde_json::Value),
}

/// Props of a component, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props(BTreeMap<String, PropValue>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: PropValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bound(&self, name: &str) -> Option<&BoundValue> {
        match self.0.get(name) {
            Some(PropValue::Bound(value)) => Some(value),
            _ => None,
        }
    }

    pub fn children(&self, name: &str) -> Option<&[String]> {
        match self.0.get(name) {
            Some(PropValue::Children(ids)) => Some(ids),
            _ => None,
        }
    }

    pub fn action(&self) -> Option<&ActionTemplate> {
        match self.0.get("action") {
            Some(PropValue::Action(template)) => Some(template),
            _ => None,
        }
    }

    pub fn raw(&self, name: &str) -> Option<&serde_json::Value> {
        match self.0.get(name) {
            Some(PropValue::Raw(value)) => Some(value),
            _ => None,
        }
    }

    /// A raw string prop, such as a single child id or a usage hint.
    pub fn raw_str(&self, name: &str) -> Option<&str> {
        self.raw(name).and_then(serde_json::Value::as_str)
    }

    /// Every data path the bound props read, in prop order.
    pub fn dependencies(&self) -> Vec<&DataPath> {
        self.0
            .values()
            .filter_map(|value| match value {
                PropValue::Bound(bound) => bound.dependency(),
                _ => None,
            })
            .collect()
    }
}

/// One declared widget instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    pub id: String,
    /// The component type, e.g. `Button`.
    pub kind: String,
    pub props: Props,
    /// Optional flex weight inside a row or column.
    pub weight: Option<f64>,
}

impl ComponentNode {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, props: Props) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            props,
            weight: None,
        }
    }
}

/// The node table and declared root of one surface.
#[derive(Debug, Clone, Default)]
pub struct ComponentGraph {
    root: Option<String>,
    nodes: HashMap<String, ComponentNode>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the render entry point. Returns `true` if the root changed.
    pub fn declare_root(&mut self, root: impl Into<String>) -> bool {
        let root = root.into();
        if self.root.as_deref() == Some(root.as_str()) {
            return false;
        }
        if let Some(previous) = &self.root {
            tracing::info!(previous = %previous, root = %root, "surface root re-declared");
        }
        self.root = Some(root);
        true
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Insert or overwrite every node by id and return the ids written.
    ///
    /// Takes `&mut self`, so no reader can observe a partially applied
    /// batch.
    pub fn apply_update(&mut self, nodes: Vec<ComponentNode>) -> Vec<String> {
        let mut written = Vec::with_capacity(nodes.len());
        for node in nodes {
            written.push(node.id.clone());
            self.nodes.insert(node.id.clone(), node);
        }
        written
    }

    pub fn get(&self, id: &str) -> Option<&ComponentNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ComponentNode> {
        self.nodes.values()
    }

    /// Ordered child ids of `node`, per its type's child shape.
    pub fn resolve_children<'a>(
        &self,
        node: &'a ComponentNode,
        catalog: &ComponentCatalog,
    ) -> Vec<&'a str> {
        catalog.children_of(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(id: &str, value: &str) -> ComponentNode {
        ComponentNode::new(
            id,
            "Text",
            Props::new().with("text", PropValue::Bound(BoundValue::literal(value))),
        )
    }

    #[test]
    fn test_declare_root_idempotent() {
        let mut graph = ComponentGraph::new();
        assert!(graph.declare_root("root"));
        assert!(!graph.declare_root("root"));
        assert_eq!(graph.root(), Some("root"));
        assert!(graph.declare_root("other"));
        assert_eq!(graph.root(), Some("other"));
    }

    #[test]
    fn test_apply_update_inserts_and_overwrites() {
        let mut graph = ComponentGraph::new();
        graph.apply_update(vec![text("a", "one"), text("b", "two")]);
        assert_eq!(graph.len(), 2);

        let written = graph.apply_update(vec![text("a", "uno")]);
        assert_eq!(written, vec!["a".to_string()]);
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.get("a").and_then(|n| n.props.bound("text")),
            Some(&BoundValue::literal("uno"))
        );
    }

    #[test]
    fn test_resend_replaces_props_wholesale() {
        let mut graph = ComponentGraph::new();
        let first = ComponentNode::new(
            "a",
            "Text",
            Props::new()
                .with("text", PropValue::Bound(BoundValue::literal("x")))
                .with("usageHint", PropValue::Raw(json!("h1"))),
        );
        graph.apply_update(vec![first]);
        graph.apply_update(vec![text("a", "y")]);

        let node = graph.get("a").unwrap();
        assert_eq!(node.props.len(), 1);
        assert!(node.props.raw("usageHint").is_none());
    }

    #[test]
    fn test_batch_order_does_not_matter() {
        let mut forward = ComponentGraph::new();
        forward.apply_update(vec![text("a", "1"), text("b", "2"), text("c", "3")]);
        let mut backward = ComponentGraph::new();
        backward.apply_update(vec![text("c", "3"), text("a", "1"), text("b", "2")]);

        for id in ["a", "b", "c"] {
            assert_eq!(forward.get(id), backward.get(id));
        }
    }

    #[test]
    fn test_props_accessors() {
        let props = Props::new()
            .with("children", PropValue::Children(vec!["a".into(), "b".into()]))
            .with("label", PropValue::Bound(BoundValue::reference("/name")))
            .with("child", PropValue::Raw(json!("c")))
            .with("action", PropValue::Action(ActionTemplate::new("submit")));

        assert_eq!(props.children("children"), Some(&["a".to_string(), "b".to_string()][..]));
        assert_eq!(props.raw_str("child"), Some("c"));
        assert_eq!(props.action().map(|a| a.name.as_str()), Some("submit"));
        assert_eq!(props.dependencies(), vec![&DataPath::parse("/name")]);
        assert!(props.bound("children").is_none());
    }
}
