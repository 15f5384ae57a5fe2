//! Path-addressable data model store
//!
//! Each surface owns one [`DataModel`]: a trie keyed by path segment where a
//! node holds either a value or a map of named children. Paths are
//! `/`-delimited (`/tasks/ch5`); `/` and the empty string address the root.
//!
//! Writes come in two forms:
//! - [`DataModel::write`] sets one value at a path.
//! - [`DataModel::merge`] upserts named entries into the map at a path and
//!   leaves sibling keys untouched.
//!
//! Both create intermediate maps as needed. A value standing where a map is
//! required is replaced by an empty map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::DataValue;

/// A `/`-delimited path into a data model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path. Empty segments are dropped, so `a//b/` equals `/a/b`.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a key. Keys may contain `/` to descend several levels; the
    /// empty key yields this path unchanged.
    pub fn join(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(key.split('/').filter(|s| !s.is_empty()).map(str::to_string));
        Self { segments }
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_ancestor_or_equal(&self, other: &DataPath) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for DataPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl Serialize for DataPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One `key -> value` pair of a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct DataEntry {
    pub key: String,
    pub value: EntryValue,
}

impl DataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        Self {
            key: key.into(),
            value: EntryValue::Value(value.into()),
        }
    }

    pub fn map(key: impl Into<String>, entries: Vec<DataEntry>) -> Self {
        Self {
            key: key.into(),
            value: EntryValue::Map(entries),
        }
    }
}

/// The payload of a [`DataEntry`]: a value, or nested entries merged into a
/// child map.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    Value(DataValue),
    Map(Vec<DataEntry>),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct DataNode {
    value: Option<DataValue>,
    children: BTreeMap<String, DataNode>,
}

impl DataNode {
    fn set_value(&mut self, value: DataValue) {
        self.children.clear();
        self.value = Some(value);
    }

    /// Child by key, turning this node into a map first if it held a value.
    fn child_mut(&mut self, key: &str) -> &mut DataNode {
        self.value = None;
        self.children.entry(key.to_string()).or_default()
    }

    fn descend_mut(&mut self, segments: &[String]) -> &mut DataNode {
        segments
            .iter()
            .fold(self, |node, segment| node.child_mut(segment))
    }

    fn merge(&mut self, entries: Vec<DataEntry>) {
        self.value = None;
        for entry in entries {
            // An empty key resolves to this node.
            let target = self.descend_mut(DataPath::root().join(&entry.key).segments());
            match entry.value {
                EntryValue::Value(value) => target.set_value(value),
                EntryValue::Map(nested) => target.merge(nested),
            }
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match &self.value {
            Some(value) => value.to_json(),
            None => serde_json::Value::Object(
                self.children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_json()))
                    .collect(),
            ),
        }
    }

    fn flatten<'a>(&'a self, path: DataPath, out: &mut Vec<(DataPath, &'a DataValue)>) {
        if let Some(value) = &self.value {
            out.push((path, value));
            return;
        }
        for (key, child) in &self.children {
            child.flatten(path.join(key), out);
        }
    }
}

/// Handle returned by [`DataModel::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&DataPath) + Send>;

struct Subscription {
    id: SubscriptionId,
    path: DataPath,
    listener: Listener,
}

/// A surface's reactive data model.
///
/// Reading an undefined path yields `None`; there is no error path.
/// Values are stored exactly as written and never coerced.
#[derive(Default)]
pub struct DataModel {
    root: DataNode,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
}

impl fmt::Debug for DataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataModel")
            .field("root", &self.root)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl DataModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, path: &DataPath) -> Option<&DataNode> {
        path.segments()
            .iter()
            .try_fold(&self.root, |node, segment| node.children.get(segment))
    }

    /// The value at `path`, or `None` when nothing is there or the path
    /// addresses a map.
    pub fn read(&self, path: &DataPath) -> Option<&DataValue> {
        self.node(path).and_then(|node| node.value.as_ref())
    }

    /// Whether anything (value or map) exists at `path`.
    pub fn contains(&self, path: &DataPath) -> bool {
        self.node(path).is_some()
    }

    /// Child keys of the map at `path`. Empty for values and absent paths.
    pub fn keys(&self, path: &DataPath) -> Vec<&str> {
        self.node(path)
            .map(|node| node.children.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// JSON snapshot of the subtree at `path`.
    pub fn to_json(&self, path: &DataPath) -> Option<serde_json::Value> {
        self.node(path).map(DataNode::to_json)
    }

    /// Every stored value with its full path, in key order.
    pub fn flatten(&self) -> Vec<(DataPath, &DataValue)> {
        let mut out = Vec::new();
        self.root.flatten(DataPath::root(), &mut out);
        out
    }

    /// Set a single value at `path`, creating intermediate maps.
    pub fn write(&mut self, path: &DataPath, value: DataValue) {
        tracing::trace!(path = %path, kind = value.type_name(), "data model write");
        self.root.descend_mut(path.segments()).set_value(value);
        self.notify(path);
    }

    /// Upsert `entries` into the map at `path`, in order.
    ///
    /// Keys not named in `entries` are kept. An entry with the empty key
    /// writes at `path` itself, so a later keyed entry turns that value
    /// back into a map. Empty `entries` leave the model untouched.
    pub fn merge(&mut self, path: &DataPath, entries: Vec<DataEntry>) {
        if entries.is_empty() {
            return;
        }
        tracing::trace!(path = %path, entries = entries.len(), "data model merge");
        self.root.descend_mut(path.segments()).merge(entries);
        self.notify(path);
    }

    /// Call `listener` after every write or merge at `path` or one of its
    /// ancestors.
    pub fn subscribe(
        &mut self,
        path: DataPath,
        listener: impl FnMut(&DataPath) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            id,
            path,
            listener: Box::new(listener),
        });
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != id);
        self.subscriptions.len() != before
    }

    fn notify(&mut self, changed: &DataPath) {
        for sub in &mut self.subscriptions {
            if changed.is_ancestor_or_equal(&sub.path) {
                (sub.listener)(changed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn path(s: &str) -> DataPath {
        DataPath::parse(s)
    }

    #[test]
    fn test_path_parse_and_display() {
        assert_eq!(path("/a/b").to_string(), "/a/b");
        assert_eq!(path("a//b/").to_string(), "/a/b");
        assert_eq!(path("").to_string(), "/");
        assert!(path("/").is_root());
        assert_eq!(path("/a").join("b/c"), path("/a/b/c"));
        assert_eq!(path("/a").join(""), path("/a"));
    }

    #[test]
    fn test_path_ancestry() {
        assert!(path("/").is_ancestor_or_equal(&path("/a/b")));
        assert!(path("/a").is_ancestor_or_equal(&path("/a/b")));
        assert!(path("/a/b").is_ancestor_or_equal(&path("/a/b")));
        assert!(!path("/a/b").is_ancestor_or_equal(&path("/a")));
        assert!(!path("/ab").is_ancestor_or_equal(&path("/a/b")));
    }

    #[test]
    fn test_read_absent_is_none() {
        let model = DataModel::new();
        assert_eq!(model.read(&path("/nothing/here")), None);
        assert!(!model.contains(&path("/nothing")));
    }

    #[test]
    fn test_write_creates_intermediates() {
        let mut model = DataModel::new();
        model.write(&path("/a/b/c"), DataValue::from(1i64));
        assert_eq!(model.read(&path("/a/b/c")), Some(&DataValue::from(1i64)));
        assert_eq!(model.read(&path("/a/b")), None);
        assert!(model.contains(&path("/a/b")));
        assert_eq!(model.keys(&path("/a")), vec!["b"]);
    }

    #[test]
    fn test_merge_keeps_siblings() {
        let mut model = DataModel::new();
        model.merge(&path("/form"), vec![DataEntry::new("a", 1i64)]);
        model.merge(&path("/form"), vec![DataEntry::new("b", 2i64)]);
        assert_eq!(model.to_json(&path("/form")), Some(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_merge_overwrites_same_key() {
        let mut model = DataModel::new();
        model.merge(&path("/form"), vec![DataEntry::new("a", 1i64)]);
        model.merge(&path("/form"), vec![DataEntry::new("a", "one")]);
        assert_eq!(model.read(&path("/form/a")), Some(&DataValue::from("one")));
    }

    #[test]
    fn test_merge_empty_key_writes_at_path() {
        let mut model = DataModel::new();
        model.merge(&path("/x"), vec![DataEntry::new("", "42")]);
        assert_eq!(model.read(&path("/x")), Some(&DataValue::from("42")));
    }

    #[test]
    fn test_merge_applies_entries_in_order() {
        let mut model = DataModel::new();
        model.merge(
            &path("/x"),
            vec![DataEntry::new("", "seed"), DataEntry::new("a", "later")],
        );
        assert_eq!(model.read(&path("/x")), None);
        assert_eq!(model.read(&path("/x/a")), Some(&DataValue::from("later")));

        let mut model = DataModel::new();
        model.merge(
            &path("/x"),
            vec![DataEntry::new("a", "first"), DataEntry::new("", "seed")],
        );
        assert_eq!(model.read(&path("/x")), Some(&DataValue::from("seed")));
        assert_eq!(model.read(&path("/x/a")), None);
    }

    #[test]
    fn test_empty_merge_keeps_scalar_ancestor() {
        let mut model = DataModel::new();
        model.write(&path("/slot"), DataValue::from("scalar"));
        model.merge(&path("/slot/inner"), Vec::new());
        assert_eq!(model.read(&path("/slot")), Some(&DataValue::from("scalar")));
        assert!(!model.contains(&path("/slot/inner")));
    }

    #[test]
    fn test_merge_nested_map() {
        let mut model = DataModel::new();
        model.merge(
            &path("/"),
            vec![DataEntry::map(
                "user",
                vec![DataEntry::new("name", "Ada"), DataEntry::new("admin", true)],
            )],
        );
        model.merge(
            &path("/"),
            vec![DataEntry::map("user", vec![DataEntry::new("age", 36i64)])],
        );
        assert_eq!(
            model.to_json(&path("/user")),
            Some(json!({"name": "Ada", "admin": true, "age": 36}))
        );
    }

    #[test]
    fn test_value_replaced_by_map_on_merge() {
        let mut model = DataModel::new();
        model.write(&path("/slot"), DataValue::from("scalar"));
        model.merge(&path("/slot"), vec![DataEntry::new("k", "v")]);
        assert_eq!(model.read(&path("/slot")), None);
        assert_eq!(model.read(&path("/slot/k")), Some(&DataValue::from("v")));
    }

    #[test]
    fn test_write_replaces_map() {
        let mut model = DataModel::new();
        model.merge(&path("/slot"), vec![DataEntry::new("k", "v")]);
        model.write(&path("/slot"), DataValue::from(false));
        assert_eq!(model.read(&path("/slot")), Some(&DataValue::from(false)));
        assert_eq!(model.read(&path("/slot/k")), None);
    }

    #[test]
    fn test_flatten_lists_values_in_key_order() {
        let mut model = DataModel::new();
        model.merge(
            &path("/tasks"),
            vec![DataEntry::new("b", true), DataEntry::new("a", false)],
        );
        let flat: Vec<String> = model
            .flatten()
            .into_iter()
            .map(|(p, v)| format!("{p}={v}"))
            .collect();
        assert_eq!(flat, vec!["/tasks/a=false", "/tasks/b=true"]);
    }

    #[test]
    fn test_subscribe_ancestor_or_equal() {
        let mut model = DataModel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        model.subscribe(path("/tasks/ch5"), move |changed| {
            sink.lock().unwrap().push(changed.to_string());
        });

        model.merge(&path("/tasks"), vec![DataEntry::new("ch5", true)]);
        model.write(&path("/tasks/ch5"), DataValue::from(false));
        model.write(&path("/tasks/other"), DataValue::from(true));
        model.write(&path("/elsewhere"), DataValue::from(true));

        assert_eq!(*seen.lock().unwrap(), vec!["/tasks", "/tasks/ch5"]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut model = DataModel::new();
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        let id = model.subscribe(path("/x"), move |_| *sink.lock().unwrap() += 1);

        model.write(&path("/x"), DataValue::from(1i64));
        assert!(model.unsubscribe(id));
        assert!(!model.unsubscribe(id));
        model.write(&path("/x"), DataValue::from(2i64));

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
