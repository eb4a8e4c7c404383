//! RAM cache step.

use tracing::trace;

use crate::cache::CacheStore;
use crate::descriptor::CacheSpec;
use crate::handler::{BoxFuture, ErasedUnit, Next};
use crate::request::Request;
use crate::response::{Envelope, Response};

/// Answers from the store when the request's hash is already cached;
/// otherwise runs the rest of the pipeline and keeps its success result.
///
/// Hits are always sent as `200`, whatever the original status was. Error
/// envelopes and raw bodies are never stored. There is no single-flight:
/// concurrent misses all run the action and the last one to finish wins.
pub(crate) struct RamCache {
    spec: CacheSpec,
    store: CacheStore,
}

impl RamCache {
    pub(crate) fn new(spec: CacheSpec, store: CacheStore) -> Self {
        store.ensure(&spec.key);
        Self { spec, store }
    }
}

impl ErasedUnit for RamCache {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let hash = self.spec.hash(&req);

        if let Some(payload) = self.store.get(&self.spec.key, &hash) {
            trace!(key = %self.spec.key, %hash, "ram cache hit");
            return Box::pin(async move { Response::ok(payload) });
        }

        let store = self.store.clone();
        let key = self.spec.key.clone();
        let fut = next.run(req);

        Box::pin(async move {
            let res = fut.await;
            if let Some(Envelope::Success { result, .. }) = res.envelope() {
                trace!(%key, %hash, "ram cache store");
                store.insert(&key, hash, result.clone());
            }
            res
        })
    }
}
