//! Error and fault types
//!
//! Nothing in the engine is fatal. Faults raised while ingesting or walking
//! a surface are reported as values and the offending line or subtree is
//! skipped:
//!
//! | Fault | Raised by | Outcome |
//! |-------|-----------|---------|
//! | [`Fault::Decode`] | [`Engine::ingest`](crate::Engine::ingest) | line skipped, stream continues |
//! | [`Fault::UnknownComponentType`] | render walk | inert placeholder widget |
//! | [`Fault::CyclicGraph`] | render walk | subtree renders empty |
//! | [`Fault::DepthLimit`] | render walk | subtree renders empty |
//!
//! A missing data model reference is never a fault: it resolves to a fallback.

use thiserror::Error;

/// Longest excerpt of an offending line kept in a [`DecodeError`].
const EXCERPT_CHARS: usize = 80;

/// A protocol line that could not be decoded into a message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {problem} (in `{excerpt}`)")]
pub struct DecodeError {
    /// 1-based line number within the stream fed to the decoder.
    pub line: usize,
    /// The beginning of the offending line.
    pub excerpt: String,
    /// What was wrong with it.
    pub problem: DecodeProblem,
}

impl DecodeError {
    pub(crate) fn new(line: usize, text: &str, problem: DecodeProblem) -> Self {
        let mut excerpt: String = text.trim().chars().take(EXCERPT_CHARS).collect();
        if text.trim().chars().count() > EXCERPT_CHARS {
            excerpt.push('…');
        }
        Self {
            line,
            excerpt,
            problem,
        }
    }
}

/// The parse problem behind a [`DecodeError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeProblem {
    #[error("empty line")]
    Empty,

    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    #[error("line is {len} bytes, limit is {max}")]
    LineTooLong { len: usize, max: usize },

    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("message must be a JSON object")]
    NotAnObject,

    #[error("message envelope has no kind")]
    EmptyEnvelope,

    #[error("message envelope has {0} kinds, expected exactly one")]
    MultipleKinds(usize),

    #[error("`{kind}` is missing `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("`{kind}` has invalid `{field}`: {reason}")]
    InvalidField {
        kind: &'static str,
        field: String,
        reason: String,
    },

    #[error("component `{id}` appears twice in one update with different bodies")]
    ConflictingComponent { id: String },
}

/// A non-fatal fault reported to the host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("surface `{surface_id}`: component `{component_id}` has unknown type `{kind}`")]
    UnknownComponentType {
        surface_id: String,
        component_id: String,
        kind: String,
    },

    #[error("surface `{surface_id}`: component `{component_id}` is its own ancestor")]
    CyclicGraph {
        surface_id: String,
        component_id: String,
    },

    #[error("surface `{surface_id}`: component `{component_id}` exceeds render depth {limit}")]
    DepthLimit {
        surface_id: String,
        component_id: String,
        limit: usize,
    },
}

/// Host-side misuse when driving a user gesture into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("unknown surface `{0}`")]
    UnknownSurface(String),

    #[error("surface `{surface_id}` has no component `{component_id}`")]
    UnknownComponent {
        surface_id: String,
        component_id: String,
    },

    #[error("component `{0}` carries no action")]
    NoAction(String),

    #[error("component `{0}` has no writable data binding")]
    NotBound(String),
}

/// An engine configuration that could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("engine config `{field}` must be greater than zero")]
    Zero { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_names_line_and_problem() {
        let err = DecodeError::new(7, "{not json", DecodeProblem::Json("eof".into()));
        let text = err.to_string();
        assert!(text.contains("line 7"));
        assert!(text.contains("invalid JSON"));
        assert!(text.contains("{not json"));
    }

    #[test]
    fn test_decode_error_truncates_excerpt() {
        let long = "x".repeat(500);
        let err = DecodeError::new(1, &long, DecodeProblem::NotAnObject);
        assert_eq!(err.excerpt.chars().count(), EXCERPT_CHARS + 1);
        assert!(err.excerpt.ends_with('…'));
    }

    #[test]
    fn test_fault_from_decode_error() {
        let err = DecodeError::new(2, "[]", DecodeProblem::NotAnObject);
        let fault: Fault = err.clone().into();
        assert_eq!(fault, Fault::Decode(err));
    }
}
