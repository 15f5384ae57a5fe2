//! Message logging with pattern-based filtering and in-memory storage
//!
//! Filters on the envelope kind (`beginRendering`, `surfaceUpdate`, ...)
//! using glob patterns, and keeps a ring buffer of recent message summaries
//! for display in host debug panels.
//!
//! ```
//! use surface_dispatch_core::debug::{MessageLogConfig, MessageLogFilter, MessageLogMiddleware};
//! use surface_dispatch_core::Engine;
//!
//! let filter = MessageLogFilter::new(Some("surface*,data*"), None);
//! let mut engine = Engine::new().with_middleware(MessageLogMiddleware::with_log(
//!     MessageLogConfig::new(50, filter),
//! ));
//! engine.ingest(r#"{"beginRendering": {"surfaceId": "s1", "root": "c1"}}"#);
//! engine.ingest(r#"{"dataModelUpdate": {"surfaceId": "s1", "contents": []}}"#);
//!
//! let log = engine.middleware().log().unwrap();
//! assert_eq!(log.len(), 1);
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use crate::engine::ApplyOutcome;
use crate::error::DecodeError;
use crate::middleware::Middleware;
use crate::protocol::Message;

/// Pseudo-kind under which rejected lines are logged.
pub const DECODE_ERROR: &str = "decodeError";

/// Include/exclude glob patterns on the envelope kind.
///
/// Patterns support `*` (any sequence) and `?` (one character).
#[derive(Debug, Clone, Default)]
pub struct MessageLogFilter {
    /// If non-empty, only log kinds matching one of these
    pub include_patterns: Vec<String>,
    /// Exclude kinds matching these (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl MessageLogFilter {
    /// Build from comma-separated pattern strings.
    ///
    /// ```
    /// use surface_dispatch_core::debug::MessageLogFilter;
    ///
    /// let filter = MessageLogFilter::new(Some("surface*,begin*"), Some("*Rendering"));
    /// assert!(filter.should_log("surfaceUpdate"));
    /// assert!(!filter.should_log("beginRendering"));
    /// assert!(!filter.should_log("dataModelUpdate"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let split = |s: &str| -> Vec<String> {
            s.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        };
        Self {
            include_patterns: include.map(split).unwrap_or_default(),
            exclude_patterns: exclude.map(split).unwrap_or_default(),
        }
    }

    pub fn should_log(&self, kind: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| glob_match(p, kind))
        {
            return false;
        }
        !self.exclude_patterns.iter().any(|p| glob_match(p, kind))
    }
}

/// An entry in the message log
#[derive(Debug, Clone)]
pub struct MessageLogEntry {
    /// Envelope kind, or [`DECODE_ERROR`]
    pub kind: String,
    pub surface_id: Option<String>,
    pub summary: String,
    pub timestamp: Instant,
    /// Sequence number for ordering
    pub sequence: u64,
    /// Whether applying the message changed anything. `None` until applied,
    /// and for messages that were ignored.
    pub changed: Option<bool>,
}

impl MessageLogEntry {
    fn new(kind: String, surface_id: Option<String>, summary: String, sequence: u64) -> Self {
        Self {
            kind,
            surface_id,
            summary,
            timestamp: Instant::now(),
            sequence,
            changed: None,
        }
    }

    /// Format the elapsed time for display (e.g., "2.3s", "150ms")
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.timestamp.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

/// Ring buffer configuration
#[derive(Debug, Clone)]
pub struct MessageLogConfig {
    pub capacity: usize,
    pub filter: MessageLogFilter,
}

impl Default for MessageLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: MessageLogFilter::default(),
        }
    }
}

impl MessageLogConfig {
    pub fn new(capacity: usize, filter: MessageLogFilter) -> Self {
        Self { capacity, filter }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }
}

/// In-memory ring buffer of recent messages. Oldest entries are dropped
/// once capacity is reached.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<MessageLogEntry>,
    config: MessageLogConfig,
    next_sequence: u64,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(MessageLogConfig::default())
    }
}

impl MessageLog {
    pub fn new(config: MessageLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Log a message if it passes the filter.
    pub fn log(&mut self, message: &Message) -> Option<&MessageLogEntry> {
        self.push(
            message.name(),
            message.surface_id().map(str::to_string),
            message.summary(),
        )
    }

    /// Log a rejected line if `decodeError` passes the filter.
    pub fn log_error(&mut self, error: &DecodeError) -> Option<&MessageLogEntry> {
        self.push(DECODE_ERROR, None, error.to_string())
    }

    fn push(
        &mut self,
        kind: &str,
        surface_id: Option<String>,
        summary: String,
    ) -> Option<&MessageLogEntry> {
        if self.config.capacity == 0 || !self.config.filter.should_log(kind) {
            return None;
        }
        let entry = MessageLogEntry::new(kind.to_string(), surface_id, summary, self.next_sequence);
        self.next_sequence += 1;

        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.entries.back()
    }

    fn update_last_changed(&mut self, changed: bool) {
        if let Some(entry) = self.entries.back_mut() {
            entry.changed = Some(changed);
        }
    }

    /// All entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &MessageLogEntry> {
        self.entries.iter()
    }

    /// The most recent `count` entries, newest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &MessageLogEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn config(&self) -> &MessageLogConfig {
        &self.config
    }
}

/// Middleware that traces messages matching a filter and optionally keeps
/// them in a [`MessageLog`].
#[derive(Debug, Clone)]
pub struct MessageLogMiddleware {
    filter: MessageLogFilter,
    log: Option<MessageLog>,
    /// Whether the message in flight made it into the log
    last_logged: bool,
    active: bool,
}

impl MessageLogMiddleware {
    /// Tracing only, no in-memory storage
    pub fn new(filter: MessageLogFilter) -> Self {
        Self {
            filter,
            log: None,
            last_logged: false,
            active: true,
        }
    }

    /// Tracing plus an in-memory ring buffer
    pub fn with_log(config: MessageLogConfig) -> Self {
        Self {
            filter: config.filter.clone(),
            log: Some(MessageLog::new(config)),
            last_logged: false,
            active: true,
        }
    }

    pub fn with_default_log() -> Self {
        Self::with_log(MessageLogConfig::default())
    }

    /// When inactive every hook is a no-op.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn log(&self) -> Option<&MessageLog> {
        self.log.as_ref()
    }

    pub fn log_mut(&mut self) -> Option<&mut MessageLog> {
        self.log.as_mut()
    }
}

impl Middleware for MessageLogMiddleware {
    fn before(&mut self, message: &Message) {
        if !self.active {
            return;
        }
        if self.filter.should_log(message.name()) {
            tracing::debug!(kind = %message.name(), summary = %message.summary(), "message");
        }
        self.last_logged = self
            .log
            .as_mut()
            .is_some_and(|log| log.log(message).is_some());
    }

    fn after(&mut self, _message: &Message, outcome: Option<&ApplyOutcome>) {
        if !self.active || !self.last_logged {
            return;
        }
        if let (Some(log), Some(outcome)) = (self.log.as_mut(), outcome) {
            log.update_last_changed(outcome.changed());
        }
    }

    fn on_decode_error(&mut self, error: &DecodeError) {
        if !self.active {
            return;
        }
        if let Some(log) = self.log.as_mut() {
            log.log_error(error);
        }
    }
}

/// Glob matching supporting `*` (zero or more) and `?` (exactly one).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('*') => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '?' || c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                Some((star_pi, star_ti)) => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    star = Some((star_pi, star_ti + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}
