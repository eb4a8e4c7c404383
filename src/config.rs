//! Layer configuration.

use std::sync::Arc;

use crate::logger::{Logger, NoopLogger, TracingLogger};
use crate::typology::{SchemaValidator, Typology};

/// Collaborators a [`Dolman`](crate::Dolman) hands to the pipelines it
/// builds.
///
/// ```rust
/// use dolman::{Config, Dolman, Typology};
///
/// let dolman = Dolman::with_config(
///     Config::new()
///         .types(Typology::new().with_type("custom", |v| v == "custom"))
///         .quiet(),
/// );
/// ```
#[derive(Clone)]
pub struct Config {
    pub(crate) validator: Arc<dyn SchemaValidator>,
    pub(crate) logger: Arc<dyn Logger>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a [`Typology`] with custom types as the validator.
    pub fn types(self, types: Typology) -> Self {
        self.validator(types)
    }

    pub fn validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Silences mask warnings and `server_error` logs.
    pub fn quiet(self) -> Self {
        self.logger(NoopLogger)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validator: Arc::new(Typology::new()),
            logger: Arc::new(TracingLogger),
        }
    }
}
