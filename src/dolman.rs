//! The entry point: process-scoped state plus the two produced operations,
//! `router` and `specs`.

use std::fmt;
use std::sync::Arc;

use serde_json::json;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::descriptor::RouteDescriptor;
use crate::error::Error;
use crate::handler::Unit;
use crate::logger::Logger;
use crate::middleware::Assembler;
use crate::registry::RouteRegistry;
use crate::response::Response;
use crate::router::Router;
use crate::spec::{DispatchNode, SpecDocument, SpecExtractor};
use crate::typology::SchemaValidator;

/// Owns the route registry and the RAM cache store for the lifetime of the
/// process. Cheap to clone; clones share everything, so handlers can keep
/// one around to call [`Dolman::server_error`].
#[derive(Clone)]
pub struct Dolman {
    registry: Arc<RouteRegistry>,
    store: CacheStore,
    validator: Arc<dyn SchemaValidator>,
    logger: Arc<dyn Logger>,
}

impl Dolman {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            registry: Arc::new(RouteRegistry::new()),
            store: CacheStore::new(),
            validator: config.validator,
            logger: config.logger,
        }
    }

    /// Assembles `routes` into a mountable router.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for the first descriptor that:
    ///
    /// - has no `url` or no action;
    /// - names an unknown method;
    /// - carries a malformed mask or http cache spec;
    /// - is rejected by the router: the same method and path registered
    ///   twice, or paths whose parameters conflict (`/a/:id` and
    ///   `/a/:name` under one method). Later routes never shadow earlier
    ///   ones silently.
    pub fn router(&self, routes: Vec<RouteDescriptor>) -> Result<Router, Error> {
        self.router_with(Vec::new(), routes, Vec::new())
    }

    /// Assembles `routes`, running `before` ahead of and `after` behind every
    /// route's own steps (but still ahead of its action).
    pub fn router_with(
        &self,
        before: Vec<Unit>,
        routes: Vec<RouteDescriptor>,
        after: Vec<Unit>,
    ) -> Result<Router, Error> {
        Assembler::new(
            &self.registry,
            &self.store,
            Arc::clone(&self.validator),
            Arc::clone(&self.logger),
        )
        .assemble(&before, routes, &after)
    }

    /// Describes every named route reachable from `root`, normally the fully
    /// mounted application router.
    pub fn specs(&self, root: &dyn DispatchNode) -> SpecDocument {
        SpecExtractor::new(&self.registry).extract(root)
    }

    /// Logs `err` through the configured logger and answers `500`.
    pub fn server_error(&self, err: &dyn fmt::Display) -> Response {
        self.logger.error("server error", &json!({"error": err.to_string()}));
        Response::internal_error()
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CacheStore {
        &self.store
    }
}

impl Default for Dolman {
    fn default() -> Self {
        Self::new()
    }
}
