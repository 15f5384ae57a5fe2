//! Debug state introspection trait
//!
//! Lets engine types expose their contents as titled key/value sections for
//! host debug panels, without the engine depending on any UI toolkit.

use std::fmt;

/// A debug entry (key-value pair)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEntry {
    pub key: String,
    pub value: String,
}

impl DebugEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A debug section with a title and entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSection {
    pub title: String,
    pub entries: Vec<DebugEntry>,
}

impl DebugSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    /// Add an entry to the section
    pub fn entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push(DebugEntry::new(key, value));
        self
    }

    /// Add an entry (mutable)
    pub fn push_entry(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(DebugEntry::new(key, value));
    }

    /// Value of the first entry named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }
}

impl fmt::Display for DebugSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.title)?;
        let width = self.entries.iter().map(|e| e.key.len()).max().unwrap_or(0);
        for entry in &self.entries {
            writeln!(f, "  {:width$}  {}", entry.key, entry.value)?;
        }
        Ok(())
    }
}

/// Types that can describe themselves for a debug panel.
///
/// # Example
///
/// ```
/// use surface_dispatch_core::debug::{DebugSection, DebugState};
///
/// struct Stream {
///     source: String,
///     lines: usize,
/// }
///
/// impl DebugState for Stream {
///     fn debug_sections(&self) -> Vec<DebugSection> {
///         vec![DebugSection::new("Stream")
///             .entry("source", &self.source)
///             .entry("lines", self.lines.to_string())]
///     }
/// }
///
/// let text = Stream { source: "stdin".into(), lines: 3 }.debug_text();
/// assert!(text.contains("stdin"));
/// ```
pub trait DebugState {
    /// Return state as sections with key-value pairs
    fn debug_sections(&self) -> Vec<DebugSection>;

    /// Plain-text rendering of every section.
    fn debug_text(&self) -> String {
        self.debug_sections()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

impl DebugState for () {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![]
    }
}

impl<A: DebugState, B: DebugState> DebugState for (A, B) {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let mut sections = self.0.debug_sections();
        sections.extend(self.1.debug_sections());
        sections
    }
}

impl<T: DebugState> DebugState for &T {
    fn debug_sections(&self) -> Vec<DebugSection> {
        (*self).debug_sections()
    }
}

impl<T: DebugState> DebugState for [T] {
    fn debug_sections(&self) -> Vec<DebugSection> {
        self.iter().flat_map(DebugState::debug_sections).collect()
    }
}
