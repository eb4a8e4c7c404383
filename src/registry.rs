//! Registration-token table: handler identity → route descriptor.
//!
//! Every declared route gets a fresh [`RouteId`] at assembly time. The
//! assembler wraps the head of the route's action in a shim carrying that id,
//! and the shim is what ends up in the dispatch tree. Looking a leaf up is
//! then a matter of asking it for its id. Identity is per registration:
//! two identical descriptors registered twice get two ids.
//!
//! Ids are unique across the process, not per registry, so a leaf assembled
//! by one registry never resolves in another. Tables are append-only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::descriptor::RouteDescriptor;
use crate::handler::ErasedUnit;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Token identifying one route registration. Never 0, never reused.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RouteId(pub(crate) u64);

impl RouteId {
    pub fn get(self) -> u64 {
        self.0
    }

    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Default)]
pub struct RouteRegistry {
    table: RwLock<HashMap<RouteId, Arc<RouteDescriptor>>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `descriptor` and returns its new id.
    pub fn register(&self, descriptor: Arc<RouteDescriptor>) -> RouteId {
        let id = RouteId::next();
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, descriptor);
        id
    }

    /// The descriptor registered under `id` in this registry.
    pub fn get(&self, id: RouteId) -> Option<Arc<RouteDescriptor>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.get(&id).cloned()
    }

    /// Resolves a dispatch-tree leaf. Units that were not registered here
    /// resolve to nothing.
    pub fn lookup(&self, handler: &dyn ErasedUnit) -> Option<Arc<RouteDescriptor>> {
        self.get(handler.route_id()?)
    }

    pub fn len(&self) -> usize {
        self.table.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Registered, Unit};
    use crate::request::Request;
    use crate::response::Response;

    async fn action(_req: Request) -> Response {
        Response::ok(None)
    }

    #[test]
    fn ids_are_per_registration() {
        let registry = RouteRegistry::new();
        let route = RouteDescriptor::new("/same").action(action);
        let a = registry.register(Arc::new(route.clone()));
        let b = registry.register(Arc::new(route));
        assert_ne!(a, b);
        assert!(b.get() > a.get());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn lookup_goes_through_the_shim() {
        let registry = RouteRegistry::new();
        let id = registry.register(Arc::new(RouteDescriptor::new("/hello").name("hello")));

        let bare = Unit::handler(action).0;
        assert!(registry.lookup(bare.as_ref()).is_none());

        let shim = Registered::wrap(id, bare);
        let found = registry.lookup(shim.as_ref()).unwrap();
        assert_eq!(found.name.as_deref(), Some("hello"));
    }

    #[test]
    fn unknown_ids_resolve_to_nothing() {
        let registry = RouteRegistry::new();
        assert!(registry.get(RouteId(0)).is_none());
        assert!(registry.get(RouteId(1)).is_none());
    }

    #[test]
    fn ids_never_alias_across_registries() {
        let ours = RouteRegistry::new();
        let theirs = RouteRegistry::new();
        let mine = ours.register(Arc::new(RouteDescriptor::new("/mine").name("mine")));
        let foreign = theirs.register(Arc::new(RouteDescriptor::new("/foreign").name("foreign")));

        assert_ne!(mine, foreign);
        assert!(ours.get(foreign).is_none());
        assert!(theirs.get(mine).is_none());

        let shim = Registered::wrap(foreign, Unit::handler(action).0);
        assert!(ours.lookup(shim.as_ref()).is_none());
        assert_eq!(theirs.lookup(shim.as_ref()).unwrap().name.as_deref(), Some("foreign"));
    }
}
