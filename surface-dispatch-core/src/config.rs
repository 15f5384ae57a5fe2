//! Engine limits and fallbacks

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::protocol::DEFAULT_MAX_LINE_BYTES;
use crate::value::DataValue;

/// Tunables for an [`Engine`](crate::Engine).
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```
/// use surface_dispatch_core::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{"maxRenderDepth": 16}"#).unwrap();
/// assert_eq!(config.max_render_depth, 16);
/// assert_eq!(config.max_render_nodes, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    /// Lines longer than this are rejected without parsing.
    pub max_line_bytes: usize,
    /// Deepest nesting the render walk follows before cutting a subtree.
    pub max_render_depth: usize,
    /// Most nodes a single render walk visits.
    pub max_render_nodes: usize,
    /// Value used for action context references that resolve to nothing.
    pub action_fallback: DataValue,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            max_render_depth: 64,
            max_render_nodes: 10_000,
            action_fallback: DataValue::empty(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("maxLineBytes", self.max_line_bytes),
            ("maxRenderDepth", self.max_render_depth),
            ("maxRenderNodes", self.max_render_nodes),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        Ok(())
    }

    pub fn with_max_render_depth(mut self, depth: usize) -> Self {
        self.max_render_depth = depth;
        self
    }

    pub fn with_max_render_nodes(mut self, nodes: usize) -> Self {
        self.max_render_nodes = nodes;
        self
    }

    pub fn with_max_line_bytes(mut self, bytes: usize) -> Self {
        self.max_line_bytes = bytes;
        self
    }

    pub fn with_action_fallback(mut self, fallback: impl Into<DataValue>) -> Self {
        self.action_fallback = fallback.into();
        self
    }
}
