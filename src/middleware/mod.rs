//! Pipeline assembly.
//!
//! Each descriptor becomes one route whose pipeline is, in this order:
//!
//! ```text
//! shared before → validate? → mask? → ram cache? → http cache? → shared after → action…
//! ```
//!
//! Steps only appear when the descriptor asks for them. Everything that can
//! be checked about a descriptor is checked here, once, so a router that
//! assembles is a router that cannot fail on configuration at request time.

mod http_cache;
mod mask;
mod ram_cache;
mod validate;

use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheStore;
use crate::descriptor::RouteDescriptor;
use crate::error::Error;
use crate::handler::{BoxedUnit, Registered, Unit};
use crate::logger::Logger;
use crate::mask::MaskSpec;
use crate::registry::RouteRegistry;
use crate::router::Router;
use crate::typology::SchemaValidator;

pub use http_cache::header_value as http_cache_header;

/// Builds routers from descriptors and records them in a registry.
pub struct Assembler<'a> {
    registry: &'a RouteRegistry,
    store: &'a CacheStore,
    validator: Arc<dyn SchemaValidator>,
    logger: Arc<dyn Logger>,
}

impl<'a> Assembler<'a> {
    pub fn new(
        registry: &'a RouteRegistry,
        store: &'a CacheStore,
        validator: Arc<dyn SchemaValidator>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self { registry, store, validator, logger }
    }

    /// One router holding every descriptor, in order. Stops at the first
    /// descriptor that cannot be assembled.
    pub fn assemble(
        &self,
        before: &[Unit],
        routes: Vec<RouteDescriptor>,
        after: &[Unit],
    ) -> Result<Router, Error> {
        let mut router = Router::new();
        for route in routes {
            let summary = format!("{route:?}");
            self.add(&mut router, before, route, after)
                .map_err(|e| e.in_route(summary))?;
        }
        Ok(router)
    }

    fn add(
        &self,
        router: &mut Router,
        before: &[Unit],
        route: RouteDescriptor,
        after: &[Unit],
    ) -> Result<(), Error> {
        let url = route.url.clone().ok_or_else(|| Error::config("missing url"))?;
        if route.action.is_empty() {
            return Err(Error::config("missing action"));
        }
        let methods = route.resolve_methods()?;
        let mask_spec = route.mask.as_ref().map(MaskSpec::compile).transpose()?;
        let cache_control = route.http_cache.as_ref().map(http_cache::header_value).transpose()?;

        let route = Arc::new(route);
        let id = self.registry.register(Arc::clone(&route));

        let mut stack: Vec<BoxedUnit> = before.iter().map(|unit| Arc::clone(&unit.0)).collect();

        if let Some(spec) = &route.validate {
            stack.push(Arc::new(validate::Validate::new(
                spec.clone(),
                &url,
                Arc::clone(&self.validator),
            )));
        }
        if let (Some(spec), Some(raw)) = (mask_spec, &route.mask) {
            stack.push(Arc::new(mask::Mask::new(
                spec,
                raw.clone(),
                Arc::clone(&self.validator),
                Arc::clone(&self.logger),
            )));
        }
        if let Some(spec) = &route.cache {
            stack.push(Arc::new(ram_cache::RamCache::new(spec.clone(), self.store.clone())));
        }
        if let Some(header) = cache_control {
            stack.push(Arc::new(http_cache::HttpCache::new(header)));
        }

        stack.extend(after.iter().map(|unit| Arc::clone(&unit.0)));

        let mut actions = route.action.iter().map(|unit| Arc::clone(&unit.0));
        if let Some(head) = actions.next() {
            stack.push(Registered::wrap(id, head));
        }
        stack.extend(actions);

        debug!(
            id = id.get(),
            url = %url,
            name = route.name.as_deref().unwrap_or(""),
            steps = stack.len(),
            "route assembled"
        );
        router.add(methods, &url, stack)
    }
}
