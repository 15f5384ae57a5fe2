//! Hooks around every message the engine applies

use crate::engine::ApplyOutcome;
use crate::error::DecodeError;
use crate::protocol::Message;

/// Intercepts decoded messages on their way into the engine.
///
/// `before` runs ahead of any state change and `after` once the message is
/// applied. `outcome` is `None` for unrecognized message kinds, which
/// change nothing.
pub trait Middleware {
    fn before(&mut self, message: &Message);

    fn after(&mut self, message: &Message, outcome: Option<&ApplyOutcome>);

    /// Called for every line that failed to decode.
    fn on_decode_error(&mut self, _error: &DecodeError) {}
}

/// A middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl Middleware for NoopMiddleware {
    fn before(&mut self, _message: &Message) {}
    fn after(&mut self, _message: &Message, _outcome: Option<&ApplyOutcome>) {}
}

/// Logs every message through `tracing` at debug level
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    pub log_before: bool,
    pub log_after: bool,
}

impl LoggingMiddleware {
    /// Log after apply only
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    /// Log both before and after apply
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl Middleware for LoggingMiddleware {
    fn before(&mut self, message: &Message) {
        if self.log_before {
            tracing::debug!(kind = %message.name(), surface_id = ?message.surface_id(), "Applying message");
        }
    }

    fn after(&mut self, message: &Message, outcome: Option<&ApplyOutcome>) {
        if !self.log_after {
            return;
        }
        match outcome {
            Some(outcome) => tracing::debug!(
                kind = %message.name(),
                surface_id = %outcome.surface_id,
                components = outcome.changed_components.len(),
                paths = outcome.changed_paths.len(),
                created = outcome.created_surface,
                "Message applied"
            ),
            None => tracing::debug!(kind = %message.name(), "Message ignored"),
        }
    }

    fn on_decode_error(&mut self, error: &DecodeError) {
        tracing::debug!(line = error.line, %error, "Line rejected");
    }
}

/// Runs several middlewares in sequence
#[derive(Default)]
pub struct ComposedMiddleware {
    middlewares: Vec<Box<dyn Middleware + Send>>,
}

impl std::fmt::Debug for ComposedMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middlewares_count", &self.middlewares.len())
            .finish()
    }
}

impl ComposedMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<M: Middleware + Send + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    pub fn with<M: Middleware + Send + 'static>(mut self, middleware: M) -> Self {
        self.add(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl Middleware for ComposedMiddleware {
    fn before(&mut self, message: &Message) {
        for middleware in &mut self.middlewares {
            middleware.before(message);
        }
    }

    fn after(&mut self, message: &Message, outcome: Option<&ApplyOutcome>) {
        // Reverse order so hooks nest
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.after(message, outcome);
        }
    }

    fn on_decode_error(&mut self, error: &DecodeError) {
        for middleware in &mut self.middlewares {
            middleware.on_decode_error(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode_line;
    use std::sync::{Arc, Mutex};

    struct Recording {
        name: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Recording {
        fn before(&mut self, message: &Message) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:before:{}", self.name, message.name()));
        }

        fn after(&mut self, message: &Message, outcome: Option<&ApplyOutcome>) {
            self.calls.lock().unwrap().push(format!(
                "{}:after:{}:{}",
                self.name,
                message.name(),
                outcome.is_some()
            ));
        }

        fn on_decode_error(&mut self, error: &DecodeError) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:error:{}", self.name, error.line));
        }
    }

    #[test]
    fn test_composed_middleware_nests_hooks() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut composed = ComposedMiddleware::new()
            .with(Recording {
                name: "a",
                calls: calls.clone(),
            })
            .with(Recording {
                name: "b",
                calls: calls.clone(),
            });
        assert_eq!(composed.len(), 2);

        let message = decode_line(r#"{"ping": {}}"#, 1).unwrap();
        composed.before(&message);
        composed.after(&message, None);
        composed.on_decode_error(&decode_line("", 9).unwrap_err());

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "a:before:ping",
                "b:before:ping",
                "b:after:ping:false",
                "a:after:ping:false",
                "a:error:9",
                "b:error:9",
            ]
        );
    }
}
