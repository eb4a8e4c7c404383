//! `Cache-Control` step.

use crate::descriptor::{CacheDuration, HttpCacheSpec};
use crate::error::Error;
use crate::handler::{BoxFuture, ErasedUnit, Next};
use crate::request::Request;

/// Builds the `Cache-Control` value for a spec.
///
/// Durations use the first unit set, checked in the order seconds, minutes,
/// hours, days, weeks, and always produce `private, max-age=<seconds>`.
pub fn header_value(spec: &HttpCacheSpec) -> Result<String, Error> {
    match spec {
        HttpCacheSpec::Header(header) => Ok(header.clone()),
        HttpCacheSpec::Duration(duration) => max_age(duration)
            .map(|seconds| format!("private, max-age={seconds}"))
            .ok_or_else(|| Error::config("http cache needs one of seconds, minutes, hours, days or weeks")),
    }
}

fn max_age(duration: &CacheDuration) -> Option<u64> {
    let units = [
        (duration.seconds, 1),
        (duration.minutes, 60),
        (duration.hours, 3_600),
        (duration.days, 86_400),
        (duration.weeks, 604_800),
    ];
    units.into_iter().find_map(|(value, unit)| value.map(|n| n.saturating_mul(unit)))
}

/// Sets a precomputed `Cache-Control` header on every response passing back
/// through it.
pub(crate) struct HttpCache {
    header: String,
}

impl HttpCache {
    pub(crate) fn new(header: String) -> Self {
        Self { header }
    }
}

impl ErasedUnit for HttpCache {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let header = self.header.clone();
        let fut = next.run(req);
        Box::pin(async move {
            let mut res = fut.await;
            res.set_header("Cache-Control", &header);
            res
        })
    }
}
