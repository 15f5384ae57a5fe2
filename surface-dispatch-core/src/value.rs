//! Data values and the literal/reference resolver
//!
//! Props that can be bound to the data model are a [`BoundValue`]: either a
//! literal fixed when the component was authored, or a reference into the
//! surface's [`DataModel`]. Resolution is pure and never fails; an absent
//! reference yields `None` and the caller picks its own fallback.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::data_model::{DataModel, DataPath};

/// A scalar or list of scalars.
///
/// Numbers keep the representation they arrived with (`1` stays an
/// integer, `1.5` a float).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<DataValue>),
}

impl DataValue {
    /// Convert a JSON value. Objects and `null` have no data value.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => Some(Self::Number(n.clone())),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            serde_json::Value::Null | serde_json::Value::Object(_) => None,
        }
    }

    /// Convert back into JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// A float value, or `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self::Number)
    }

    /// The empty string.
    pub fn empty() -> Self {
        Self::String(String::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DataValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant, for logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for DataValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<DataValue>> From<Vec<T>> for DataValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// A prop value: a literal constant or a reference into the data model.
///
/// The variant is fixed when the prop is decoded. Only the store content
/// behind a `Reference` changes over time.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Literal(DataValue),
    Reference(DataPath),
}

impl BoundValue {
    pub fn literal(value: impl Into<DataValue>) -> Self {
        Self::Literal(value.into())
    }

    pub fn reference(path: impl AsRef<str>) -> Self {
        Self::Reference(DataPath::parse(path.as_ref()))
    }

    /// The data path this value reads from, if any.
    pub fn dependency(&self) -> Option<&DataPath> {
        match self {
            Self::Literal(_) => None,
            Self::Reference(path) => Some(path),
        }
    }

    /// Resolve against a data model. See [`resolve`].
    pub fn resolve<'a>(&'a self, model: &'a DataModel) -> Option<&'a DataValue> {
        resolve(self, model)
    }

    /// Resolve, substituting `fallback` when the reference is absent.
    pub fn resolve_or<'a>(&'a self, model: &'a DataModel, fallback: &'a DataValue) -> &'a DataValue {
        self.resolve(model).unwrap_or(fallback)
    }

    /// Resolve for display. Absent values render as the empty string;
    /// numbers, booleans and lists use their display form.
    pub fn resolve_text<'a>(&'a self, model: &'a DataModel) -> Cow<'a, str> {
        match self.resolve(model) {
            Some(DataValue::String(s)) => Cow::Borrowed(s.as_str()),
            Some(other) => Cow::Owned(other.to_string()),
            None => Cow::Borrowed(""),
        }
    }

    /// Resolve as a boolean. Absent and non-boolean values read as `false`.
    pub fn resolve_bool(&self, model: &DataModel) -> bool {
        self.resolve(model)
            .and_then(DataValue::as_bool)
            .unwrap_or(false)
    }

    /// Resolve as a list. Absent and non-list values read as empty.
    pub fn resolve_list<'a>(&'a self, model: &'a DataModel) -> &'a [DataValue] {
        self.resolve(model)
            .and_then(DataValue::as_list)
            .unwrap_or(&[])
    }
}

/// Resolve a bound value against a data model.
///
/// Literals come back unchanged. References read the model and yield `None`
/// when nothing has been written there yet, which is expected while a
/// surface is still streaming in.
pub fn resolve<'a>(value: &'a BoundValue, model: &'a DataModel) -> Option<&'a DataValue> {
    match value {
        BoundValue::Literal(v) => Some(v),
        BoundValue::Reference(path) => model.read(path),
    }
}
