//! Logging collaborator.
//!
//! The pipeline reports soft failures (a masked payload that no longer fits
//! its mask, a handler error passed to `server_error`) through [`Logger`]
//! rather than straight to `tracing`, so an application can route or silence
//! them.

use serde_json::Value;
use tracing::{error, warn};

pub trait Logger: Send + Sync {
    fn warn(&self, message: &str, context: &Value);
    fn error(&self, message: &str, context: &Value);
}

/// Forwards to `tracing`, with the context rendered as a `context` field.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn warn(&self, message: &str, context: &Value) {
        warn!(%context, "{message}");
    }

    fn error(&self, message: &str, context: &Value) {
        error!(%context, "{message}");
    }
}

/// Drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn warn(&self, _message: &str, _context: &Value) {}
    fn error(&self, _message: &str, _context: &Value) {}
}

/// Lets an application keep a handle on the logger it configured.
impl<L: Logger + ?Sized> Logger for std::sync::Arc<L> {
    fn warn(&self, message: &str, context: &Value) {
        (**self).warn(message, context);
    }

    fn error(&self, message: &str, context: &Value) {
        (**self).error(message, context);
    }
}
