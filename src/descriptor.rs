//! Declarative route descriptors.
//!
//! A descriptor says *what* an endpoint is: where it lives, which methods it
//! answers, what runs, and which optional behaviours wrap it. The assembler
//! turns it into a pipeline; the spec extractor reads its metadata back.
//!
//! ```rust
//! use dolman::{CacheSpec, HttpCacheSpec, Request, Response, RouteDescriptor, ValidationSpec};
//! use serde_json::json;
//!
//! async fn get_user(req: Request) -> Response {
//!     Response::ok(json!({"id": req.param("id"), "name": "alice", "password": "hunter2"}))
//! }
//!
//! let route = RouteDescriptor::new("/users/:id")
//!     .name("getUser")
//!     .description("One user, by id.")
//!     .method("GET")
//!     .validate(ValidationSpec::default().params(json!({"id": "string"})))
//!     .mask(json!({"id": "string", "name": "string"}))
//!     .cache(CacheSpec::new("users").hasher(|req| req.param("id").unwrap_or_default().to_owned()))
//!     .http_cache(HttpCacheSpec::minutes(5))
//!     .action(get_user);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::handler::{Handler, Unit};
use crate::method::Method;
use crate::request::Request;
use crate::router::Methods;

/// Derives a cache entry identity from a request.
pub type Hasher = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// Hash used when a cache spec has no hasher: one entry per cache key.
pub const NO_HASH: &str = "$nohash$";

/// Method strings meaning "every method".
const WILDCARD_METHODS: [&str; 2] = ["ALL", "*"];

// ── ValidationSpec ────────────────────────────────────────────────────────────

/// Schemas for the parts of a request, checked in the order params, query,
/// body.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ValidationSpec {
    pub params: Option<Value>,
    pub query: Option<Value>,
    pub body: Option<Value>,
}

impl ValidationSpec {
    pub fn params(mut self, schema: Value) -> Self {
        self.params = Some(schema);
        self
    }

    pub fn query(mut self, schema: Value) -> Self {
        self.query = Some(schema);
        self
    }

    pub fn body(mut self, schema: Value) -> Self {
        self.body = Some(schema);
        self
    }
}

// ── CacheSpec ─────────────────────────────────────────────────────────────────

/// RAM cache settings: a namespace key and an optional hasher.
#[derive(Clone)]
pub struct CacheSpec {
    pub key: String,
    pub hasher: Option<Hasher>,
}

impl CacheSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), hasher: None }
    }

    pub fn hasher(mut self, hasher: impl Fn(&Request) -> String + Send + Sync + 'static) -> Self {
        self.hasher = Some(Arc::new(hasher));
        self
    }

    pub(crate) fn hash(&self, req: &Request) -> String {
        match &self.hasher {
            Some(hasher) => hasher(req),
            None => NO_HASH.to_owned(),
        }
    }
}

impl From<&str> for CacheSpec {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CacheSpec {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl fmt::Debug for CacheSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSpec")
            .field("key", &self.key)
            .field("hasher", &self.hasher.as_ref().map(|_| "fn"))
            .finish()
    }
}

// ── HttpCacheSpec ─────────────────────────────────────────────────────────────

/// `Cache-Control` settings: a literal header value or a duration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum HttpCacheSpec {
    Header(String),
    Duration(CacheDuration),
}

/// A `max-age` duration. Only the first set unit, in the order seconds,
/// minutes, hours, days, weeks, is used.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CacheDuration {
    pub seconds: Option<u64>,
    pub minutes: Option<u64>,
    pub hours: Option<u64>,
    pub days: Option<u64>,
    pub weeks: Option<u64>,
}

impl HttpCacheSpec {
    pub fn seconds(n: u64) -> Self {
        Self::Duration(CacheDuration { seconds: Some(n), ..CacheDuration::default() })
    }

    pub fn minutes(n: u64) -> Self {
        Self::Duration(CacheDuration { minutes: Some(n), ..CacheDuration::default() })
    }

    pub fn hours(n: u64) -> Self {
        Self::Duration(CacheDuration { hours: Some(n), ..CacheDuration::default() })
    }

    pub fn days(n: u64) -> Self {
        Self::Duration(CacheDuration { days: Some(n), ..CacheDuration::default() })
    }

    pub fn weeks(n: u64) -> Self {
        Self::Duration(CacheDuration { weeks: Some(n), ..CacheDuration::default() })
    }
}

impl From<&str> for HttpCacheSpec {
    fn from(header: &str) -> Self {
        Self::Header(header.to_owned())
    }
}

impl From<CacheDuration> for HttpCacheSpec {
    fn from(duration: CacheDuration) -> Self {
        Self::Duration(duration)
    }
}

// ── RouteDescriptor ───────────────────────────────────────────────────────────

/// One logical endpoint.
///
/// `url` and `action` are required; the builder accepts their absence so the
/// assembler can report it as a configuration error.
#[derive(Clone, Default)]
pub struct RouteDescriptor {
    pub url: Option<String>,
    pub action: Vec<Unit>,
    pub method: Option<String>,
    pub methods: Option<Vec<String>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub validate: Option<ValidationSpec>,
    pub mask: Option<Value>,
    pub cache: Option<CacheSpec>,
    pub http_cache: Option<HttpCacheSpec>,
}

impl RouteDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self::default().url(url)
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets a single handler as the action.
    pub fn action(mut self, handler: impl Handler) -> Self {
        self.action = vec![Unit::handler(handler)];
        self
    }

    /// Sets an ordered sequence of units as the action.
    pub fn actions(mut self, units: Vec<Unit>) -> Self {
        self.action = units;
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn methods<S: Into<String>>(mut self, methods: impl IntoIterator<Item = S>) -> Self {
        self.methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(mut self, spec: ValidationSpec) -> Self {
        self.validate = Some(spec);
        self
    }

    /// Raw mask configuration: a type name, an object of masks, or a
    /// one-element array of masks.
    pub fn mask(mut self, mask: Value) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn cache(mut self, spec: impl Into<CacheSpec>) -> Self {
        self.cache = Some(spec.into());
        self
    }

    pub fn http_cache(mut self, spec: impl Into<HttpCacheSpec>) -> Self {
        self.http_cache = Some(spec.into());
        self
    }

    /// Declared methods: `methods`, else `method`, else none.
    fn declared_methods(&self) -> Vec<&str> {
        match (&self.methods, &self.method) {
            (Some(list), _) if !list.is_empty() => list.iter().map(String::as_str).collect(),
            (_, Some(one)) => vec![one.as_str()],
            _ => Vec::new(),
        }
    }

    /// The methods the route is registered under.
    pub(crate) fn resolve_methods(&self) -> Result<Methods, Error> {
        let declared = self.declared_methods();
        if declared.is_empty() || declared.iter().any(|m| is_wildcard(m)) {
            return Ok(Methods::All);
        }
        declared
            .into_iter()
            .map(|m| Method::parse_loose(m).ok_or_else(|| Error::config(format!("unknown method `{m}`"))))
            .collect::<Result<Vec<_>, _>>()
            .map(Methods::Only)
    }

    /// The method reported in specs: the first declared one, uppercased, or
    /// `GET` when none is declared or the first is the wildcard.
    pub fn spec_method(&self) -> String {
        match self.declared_methods().first() {
            Some(m) if !is_wildcard(m) => m.to_ascii_uppercase(),
            _ => Method::Get.as_str().to_owned(),
        }
    }
}

fn is_wildcard(method: &str) -> bool {
    WILDCARD_METHODS.iter().any(|w| w.eq_ignore_ascii_case(method))
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("url", &self.url)
            .field("method", &self.declared_methods())
            .field("name", &self.name)
            .field("actions", &self.action.len())
            .finish_non_exhaustive()
    }
}

// ── RouteOptions ──────────────────────────────────────────────────────────────

/// Everything about a route except its code, as it appears in configuration
/// files (`httpCache`, camelCase):
///
/// ```rust
/// use dolman::{Request, Response, RouteDescriptor, RouteOptions};
///
/// let options: RouteOptions = serde_json::from_str(r#"{
///     "url": "/hello",
///     "name": "hello",
///     "cache": "hello",
///     "httpCache": { "hours": 1 }
/// }"#).unwrap();
///
/// let route = RouteDescriptor::from(options)
///     .action(|_req: Request| async { Response::ok(None) });
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    pub url: Option<String>,
    pub method: Option<String>,
    pub methods: Option<Vec<String>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub validate: Option<ValidationSpec>,
    pub mask: Option<Value>,
    /// Cache key; hashers are code and can only be set on the descriptor.
    pub cache: Option<String>,
    pub http_cache: Option<HttpCacheSpec>,
}

impl From<RouteOptions> for RouteDescriptor {
    fn from(options: RouteOptions) -> Self {
        Self {
            url: options.url,
            action: Vec::new(),
            method: options.method,
            methods: options.methods,
            name: options.name,
            description: options.description,
            validate: options.validate,
            mask: options.mask,
            cache: options.cache.map(CacheSpec::new),
            http_cache: options.http_cache,
        }
    }
}
