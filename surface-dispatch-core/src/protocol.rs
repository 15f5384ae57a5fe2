//! JSONL protocol decoder
//!
//! Every line is one single-key envelope:
//!
//! ```text
//! {"beginRendering": {"surfaceId": "s1", "root": "c1"}}
//! {"surfaceUpdate": {"surfaceId": "s1", "components": [{"id": "c1", "component": {"Text": {...}}}]}}
//! {"dataModelUpdate": {"surfaceId": "s1", "path": "/x", "contents": [{"key": "k", "valueString": "v"}]}}
//! ```
//!
//! Unrecognized envelope kinds decode to [`Message::Unrecognized`] so newer
//! producers can add message kinds without breaking older engines. A
//! recognized kind with a malformed body is a [`DecodeError`]. The decoder
//! looks at one line at a time and never validates across messages.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::action::{ActionTemplate, ContextEntry};
use crate::data_model::{DataEntry, DataPath, EntryValue};
use crate::error::{DecodeError, DecodeProblem};
use crate::graph::{ComponentNode, PropValue, Props};
use crate::value::{BoundValue, DataValue};

pub const BEGIN_RENDERING: &str = "beginRendering";
pub const SURFACE_UPDATE: &str = "surfaceUpdate";
pub const DATA_MODEL_UPDATE: &str = "dataModelUpdate";

/// Default cap on a single line, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// The recognized message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    BeginRendering,
    SurfaceUpdate,
    DataModelUpdate,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeginRendering => BEGIN_RENDERING,
            Self::SurfaceUpdate => SURFACE_UPDATE,
            Self::DataModelUpdate => DATA_MODEL_UPDATE,
        }
    }
}

/// `beginRendering`: declare a surface's root component.
#[derive(Debug, Clone, PartialEq)]
pub struct BeginRendering {
    pub surface_id: String,
    pub root: String,
    /// Surface-level style hints, passed through to the host untouched.
    pub styles: Option<Value>,
}

/// `surfaceUpdate`: insert or replace components.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceUpdate {
    pub surface_id: String,
    pub components: Vec<ComponentNode>,
}

/// `dataModelUpdate`: merge entries into the data model.
#[derive(Debug, Clone, PartialEq)]
pub struct DataModelUpdate {
    pub surface_id: String,
    pub path: DataPath,
    pub contents: Vec<DataEntry>,
}

/// A decoded protocol line.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    BeginRendering(BeginRendering),
    SurfaceUpdate(SurfaceUpdate),
    DataModelUpdate(DataModelUpdate),
    /// An envelope kind this engine does not know. Accepted and ignored.
    Unrecognized { kind: String },
}

impl Message {
    /// The envelope kind as it appears on the wire.
    pub fn name(&self) -> &str {
        match self {
            Self::BeginRendering(_) => BEGIN_RENDERING,
            Self::SurfaceUpdate(_) => SURFACE_UPDATE,
            Self::DataModelUpdate(_) => DATA_MODEL_UPDATE,
            Self::Unrecognized { kind } => kind,
        }
    }

    pub fn kind(&self) -> Option<MessageKind> {
        match self {
            Self::BeginRendering(_) => Some(MessageKind::BeginRendering),
            Self::SurfaceUpdate(_) => Some(MessageKind::SurfaceUpdate),
            Self::DataModelUpdate(_) => Some(MessageKind::DataModelUpdate),
            Self::Unrecognized { .. } => None,
        }
    }

    pub fn surface_id(&self) -> Option<&str> {
        match self {
            Self::BeginRendering(m) => Some(&m.surface_id),
            Self::SurfaceUpdate(m) => Some(&m.surface_id),
            Self::DataModelUpdate(m) => Some(&m.surface_id),
            Self::Unrecognized { .. } => None,
        }
    }

    /// One-line description for logs and debug panels.
    pub fn summary(&self) -> String {
        match self {
            Self::BeginRendering(m) => format!("{} {} root={}", BEGIN_RENDERING, m.surface_id, m.root),
            Self::SurfaceUpdate(m) => {
                let ids: Vec<&str> = m.components.iter().map(|c| c.id.as_str()).collect();
                format!("{} {} [{}]", SURFACE_UPDATE, m.surface_id, ids.join(", "))
            }
            Self::DataModelUpdate(m) => {
                let keys: Vec<&str> = m.contents.iter().map(|e| e.key.as_str()).collect();
                format!("{} {} {} [{}]", DATA_MODEL_UPDATE, m.surface_id, m.path, keys.join(", "))
            }
            Self::Unrecognized { kind } => format!("{kind} (ignored)"),
        }
    }
}

/// Stateful line decoder that numbers the lines it sees.
#[derive(Debug, Clone)]
pub struct Decoder {
    line: usize,
    max_line_bytes: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl Decoder {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            line: 0,
            max_line_bytes,
        }
    }

    /// Number of lines seen so far.
    pub fn lines_seen(&self) -> usize {
        self.line
    }

    /// Count a line that is skipped without decoding.
    pub fn skip_line(&mut self) {
        self.line += 1;
    }

    /// Decode the next line of the stream from raw bytes. Bytes that are
    /// not UTF-8 count as a line and fail with [`DecodeProblem::InvalidUtf8`].
    pub fn decode_bytes(&mut self, bytes: &[u8]) -> Result<Message, DecodeError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.decode(text),
            Err(_) => {
                self.line += 1;
                let text = String::from_utf8_lossy(bytes);
                Err(DecodeError::new(self.line, &text, DecodeProblem::InvalidUtf8))
            }
        }
    }

    /// Decode the next line of the stream.
    pub fn decode(&mut self, text: &str) -> Result<Message, DecodeError> {
        self.line += 1;
        if text.len() > self.max_line_bytes {
            let problem = DecodeProblem::LineTooLong {
                len: text.len(),
                max: self.max_line_bytes,
            };
            return Err(DecodeError::new(self.line, text, problem));
        }
        decode_line(text, self.line)
    }
}

/// Decode one line. `line` is only used to label errors.
pub fn decode_line(text: &str, line: usize) -> Result<Message, DecodeError> {
    decode_envelope(text).map_err(|problem| DecodeError::new(line, text, problem))
}

fn decode_envelope(text: &str) -> Result<Message, DecodeProblem> {
    if text.trim().is_empty() {
        return Err(DecodeProblem::Empty);
    }
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeProblem::Json(e.to_string()))?;
    let Value::Object(envelope) = value else {
        return Err(DecodeProblem::NotAnObject);
    };
    if envelope.len() > 1 {
        return Err(DecodeProblem::MultipleKinds(envelope.len()));
    }
    let Some((kind, body)) = envelope.into_iter().next() else {
        return Err(DecodeProblem::EmptyEnvelope);
    };

    match kind.as_str() {
        BEGIN_RENDERING => decode_begin_rendering(body).map(Message::BeginRendering),
        SURFACE_UPDATE => decode_surface_update(body).map(Message::SurfaceUpdate),
        DATA_MODEL_UPDATE => decode_data_model_update(body).map(Message::DataModelUpdate),
        _ => Ok(Message::Unrecognized { kind }),
    }
}

// ============================================================================
// Envelope bodies
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBeginRendering {
    surface_id: String,
    root: String,
    #[serde(default)]
    styles: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSurfaceUpdate {
    surface_id: String,
    components: Vec<WireComponent>,
}

#[derive(Deserialize)]
struct WireComponent {
    id: String,
    component: Map<String, Value>,
    #[serde(default)]
    weight: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDataModelUpdate {
    surface_id: String,
    #[serde(default)]
    path: Option<String>,
    contents: Vec<Map<String, Value>>,
}

fn body<T: for<'de> Deserialize<'de>>(kind: &'static str, value: Value) -> Result<T, DecodeProblem> {
    serde_json::from_value(value).map_err(|e| invalid(kind, "body", e.to_string()))
}

fn invalid(kind: &'static str, field: impl Into<String>, reason: impl Into<String>) -> DecodeProblem {
    DecodeProblem::InvalidField {
        kind,
        field: field.into(),
        reason: reason.into(),
    }
}

fn require_surface_id(kind: &'static str, surface_id: &str) -> Result<(), DecodeProblem> {
    if surface_id.is_empty() {
        return Err(DecodeProblem::MissingField {
            kind,
            field: "surfaceId",
        });
    }
    Ok(())
}

fn decode_begin_rendering(value: Value) -> Result<BeginRendering, DecodeProblem> {
    let wire: WireBeginRendering = body(BEGIN_RENDERING, value)?;
    require_surface_id(BEGIN_RENDERING, &wire.surface_id)?;
    if wire.root.is_empty() {
        return Err(DecodeProblem::MissingField {
            kind: BEGIN_RENDERING,
            field: "root",
        });
    }
    Ok(BeginRendering {
        surface_id: wire.surface_id,
        root: wire.root,
        styles: wire.styles,
    })
}

fn decode_surface_update(value: Value) -> Result<SurfaceUpdate, DecodeProblem> {
    let wire: WireSurfaceUpdate = body(SURFACE_UPDATE, value)?;
    require_surface_id(SURFACE_UPDATE, &wire.surface_id)?;

    let mut components: Vec<ComponentNode> = Vec::with_capacity(wire.components.len());
    let mut seen: HashMap<String, usize> = HashMap::new();
    for entry in wire.components {
        let node = decode_component(entry)?;
        match seen.get(&node.id) {
            Some(&index) if components[index] == node => continue,
            Some(_) => return Err(DecodeProblem::ConflictingComponent { id: node.id }),
            None => {
                seen.insert(node.id.clone(), components.len());
                components.push(node);
            }
        }
    }

    Ok(SurfaceUpdate {
        surface_id: wire.surface_id,
        components,
    })
}

fn decode_component(entry: WireComponent) -> Result<ComponentNode, DecodeProblem> {
    let field = |name: &str| format!("components[{}].{name}", entry.id);
    if entry.id.is_empty() {
        return Err(DecodeProblem::MissingField {
            kind: SURFACE_UPDATE,
            field: "id",
        });
    }
    if entry.component.len() != 1 {
        return Err(invalid(
            SURFACE_UPDATE,
            field("component"),
            format!("expected exactly one type, found {}", entry.component.len()),
        ));
    }
    let Some((kind, body)) = entry.component.into_iter().next() else {
        return Err(invalid(SURFACE_UPDATE, field("component"), "no type"));
    };

    let raw_props = match body {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(invalid(
                SURFACE_UPDATE,
                field(&kind),
                format!("props must be an object, found {}", json_type(&other)),
            ))
        }
    };

    let mut props = Props::new();
    for (name, value) in raw_props {
        let prop = decode_prop(&name, value)
            .map_err(|reason| invalid(SURFACE_UPDATE, field(&format!("{kind}.{name}")), reason))?;
        props.insert(name, prop);
    }

    let mut node = ComponentNode::new(entry.id, kind, props);
    node.weight = entry.weight;
    Ok(node)
}

/// Decode one prop value into its typed shape.
pub fn decode_prop(name: &str, value: Value) -> Result<PropValue, String> {
    let Value::Object(map) = value else {
        return Ok(PropValue::Raw(value));
    };

    if let Some(list) = map.get("explicitList") {
        return explicit_list(list).map(PropValue::Children);
    }
    if name == "action" && map.contains_key("name") {
        return decode_action(&map).map(PropValue::Action);
    }
    match decode_bound(&map)? {
        Some(bound) => Ok(PropValue::Bound(bound)),
        None => Ok(PropValue::Raw(Value::Object(map))),
    }
}

/// Decode `{"path": ...}` or `{"literal<Kind>": ...}`.
///
/// Returns `Ok(None)` when the object has neither shape. When both a path
/// and a literal are present the path wins.
pub fn decode_bound(map: &Map<String, Value>) -> Result<Option<BoundValue>, String> {
    if let Some(path) = map.get("path") {
        let Some(path) = path.as_str() else {
            return Err(format!("`path` must be a string, found {}", json_type(path)));
        };
        return Ok(Some(BoundValue::Reference(DataPath::parse(path))));
    }

    let mut literals = map.iter().filter(|(key, _)| is_kind_key(key, "literal"));
    let Some((key, payload)) = literals.next() else {
        return Ok(None);
    };
    if literals.next().is_some() {
        return Err("more than one literal kind".to_string());
    }
    DataValue::from_json(payload)
        .map(|value| Some(BoundValue::Literal(value)))
        .ok_or_else(|| format!("`{key}` must be a scalar or list, found {}", json_type(payload)))
}

fn explicit_list(list: &Value) -> Result<Vec<String>, String> {
    let Some(items) = list.as_array() else {
        return Err(format!("`explicitList` must be an array, found {}", json_type(list)));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("child ids must be strings, found {}", json_type(item)))
        })
        .collect()
}

fn decode_action(map: &Map<String, Value>) -> Result<ActionTemplate, String> {
    let name = map
        .get("name")
        .and_then(Value::as_str)
        .ok_or("action `name` must be a string")?;

    let mut template = ActionTemplate::new(name);
    let entries = match map.get("context") {
        None | Some(Value::Null) => return Ok(template),
        Some(Value::Array(entries)) => entries,
        Some(other) => return Err(format!("action `context` must be an array, found {}", json_type(other))),
    };

    for entry in entries {
        let key = entry
            .get("key")
            .and_then(Value::as_str)
            .ok_or("action context entries need a string `key`")?;
        let value = entry
            .get("value")
            .and_then(Value::as_object)
            .ok_or_else(|| format!("action context `{key}` needs an object `value`"))?;
        let bound = decode_bound(value)?
            .ok_or_else(|| format!("action context `{key}` is neither a path nor a literal"))?;
        template.context.push(ContextEntry::new(key, bound));
    }
    Ok(template)
}

fn decode_data_model_update(value: Value) -> Result<DataModelUpdate, DecodeProblem> {
    let wire: WireDataModelUpdate = body(DATA_MODEL_UPDATE, value)?;
    require_surface_id(DATA_MODEL_UPDATE, &wire.surface_id)?;

    let contents = decode_entries(wire.contents)
        .map_err(|reason| invalid(DATA_MODEL_UPDATE, "contents", reason))?;

    Ok(DataModelUpdate {
        surface_id: wire.surface_id,
        path: wire.path.as_deref().map(DataPath::parse).unwrap_or_default(),
        contents,
    })
}

fn decode_entries(entries: Vec<Map<String, Value>>) -> Result<Vec<DataEntry>, String> {
    entries.into_iter().map(decode_entry).collect()
}

fn decode_entry(mut entry: Map<String, Value>) -> Result<DataEntry, String> {
    let key = match entry.remove("key") {
        Some(Value::String(key)) => key,
        Some(other) => return Err(format!("entry `key` must be a string, found {}", json_type(&other))),
        None => return Err("entry is missing `key`".to_string()),
    };

    let mut values = entry.into_iter().filter(|(name, _)| is_kind_key(name, "value"));
    let Some((kind, payload)) = values.next() else {
        return Err(format!("entry `{key}` has no value"));
    };
    if values.next().is_some() {
        return Err(format!("entry `{key}` has more than one value kind"));
    }

    if kind == "valueMap" {
        let Value::Array(nested) = payload else {
            return Err(format!("entry `{key}`: `valueMap` must be an array of entries"));
        };
        let nested = nested
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(format!("entry `{key}`: nested entries must be objects, found {}", json_type(&other))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(DataEntry {
            key,
            value: EntryValue::Map(decode_entries(nested)?),
        });
    }

    DataValue::from_json(&payload)
        .map(|value| DataEntry {
            key: key.clone(),
            value: EntryValue::Value(value),
        })
        .ok_or_else(|| format!("entry `{key}`: `{kind}` must be a scalar or list, found {}", json_type(&payload)))
}

/// `literalString`, `valueBoolean`, ...: the prefix followed by a kind name.
fn is_kind_key(key: &str, prefix: &str) -> bool {
    key.strip_prefix(prefix)
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_uppercase)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
