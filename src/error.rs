//! Unified error type.

use std::borrow::Cow;

/// The error type returned by dolman's fallible operations.
///
/// Application-level errors (400, 404, 500, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// two things only: infrastructure failures while serving, and configuration
/// mistakes caught while routes are being assembled. Neither ever happens in
/// the middle of a request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binding to a port or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A route could not be assembled.
    ///
    /// `route` is a short summary of the offending descriptor, when one is
    /// known (`None` for errors raised by a standalone builder).
    #[error("configuration error: {message}{}", route_suffix(.route))]
    Config {
        message: Cow<'static, str>,
        route: Option<String>,
    },
}

impl Error {
    pub(crate) fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Config { message: message.into(), route: None }
    }

    /// Attaches a route summary to a configuration error. Other variants pass
    /// through unchanged.
    pub(crate) fn in_route(self, summary: String) -> Self {
        match self {
            Self::Config { message, route: None } => Self::Config { message, route: Some(summary) },
            other => other,
        }
    }

    /// The configuration message, if this is a configuration error.
    pub fn config_message(&self) -> Option<&str> {
        match self {
            Self::Config { message, .. } => Some(&**message),
            Self::Io(_) => None,
        }
    }
}

fn route_suffix(route: &Option<String>) -> String {
    route.as_deref().map(|r| format!(" in {r}")).unwrap_or_default()
}
