//! Handler and middleware traits, type erasure, and the pipeline continuation.
//!
//! # How pipelines are stored
//!
//! A route is an ordered list of *units*: middleware first, the handler last.
//! Every unit is stored behind the same trait object so one `Vec` can hold
//! them all, whatever concrete closure or `async fn` they came from:
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }        ← handler
//! async fn auth(req: Request, next: Next) -> Response    ← middleware
//!        ↓ Unit::handler(hello) / Unit::middleware(auth)
//! Arc::new(FnHandler(hello)) as BoxedUnit               ← one vtable each
//!        ↓ stored as Arc<[BoxedUnit]> on the route
//! Next::run(req)  at request time                       ← calls unit[i] with
//!                                                         a Next for unit[i+1]
//! ```
//!
//! A handler never sees `next`: it ends the pipeline. A middleware decides
//! whether to call `next.run(req)` and may rewrite the response it gets back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::registry::RouteId;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface shared by handlers, middleware and the
/// built-in pipeline steps.
#[doc(hidden)]
pub trait ErasedUnit {
    fn call(&self, req: Request, next: Next) -> BoxFuture;

    /// Registration token, set only on the registry shim wrapping the head of
    /// a declared route's action.
    fn route_id(&self) -> Option<RouteId> {
        None
    }
}

/// A heap-allocated, type-erased unit shared across concurrent requests.
#[doc(hidden)]
pub type BoxedUnit = Arc<dyn ErasedUnit + Send + Sync + 'static>;

// ── Public traits ─────────────────────────────────────────────────────────────

/// Implemented for every valid route handler:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// Sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::SealedHandler + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_unit(self) -> BoxedUnit;
}

/// Implemented for every valid middleware:
///
/// ```text
/// async fn name(req: Request, next: Next) -> impl IntoResponse
/// ```
///
/// Sealed like [`Handler`].
pub trait Middleware: private::SealedMiddleware + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_unit(self) -> BoxedUnit;
}

mod private {
    pub trait SealedHandler {}
    pub trait SealedMiddleware {}
}

impl<F, Fut, R> private::SealedHandler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_unit(self) -> BoxedUnit {
        Arc::new(FnHandler(self))
    }
}

impl<F, Fut, R> private::SealedMiddleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_unit(self) -> BoxedUnit {
        Arc::new(FnMiddleware(self))
    }
}

// ── Concrete wrappers ─────────────────────────────────────────────────────────

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedUnit for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, _next: Next) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

struct FnMiddleware<F>(F);

impl<F, Fut, R> ErasedUnit for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Thin shim that stamps a registration token on a caller's unit. The
/// caller's own value is never touched; the router stores the shim.
pub(crate) struct Registered {
    id: RouteId,
    inner: BoxedUnit,
}

impl Registered {
    pub(crate) fn wrap(id: RouteId, inner: BoxedUnit) -> BoxedUnit {
        Arc::new(Self { id, inner })
    }
}

impl ErasedUnit for Registered {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        self.inner.call(req, next)
    }

    fn route_id(&self) -> Option<RouteId> {
        Some(self.id)
    }
}

// ── Unit ──────────────────────────────────────────────────────────────────────

/// One element of a route pipeline: a handler or a middleware.
///
/// ```rust
/// use dolman::{Next, Request, Response, Unit};
///
/// async fn auth(req: Request, next: Next) -> Response {
///     if req.header("authorization").is_none() {
///         return Response::unauthorized();
///     }
///     next.run(req).await
/// }
///
/// async fn hello(_req: Request) -> Response {
///     Response::ok(None)
/// }
///
/// let pipeline = vec![Unit::middleware(auth), Unit::handler(hello)];
/// ```
#[derive(Clone)]
pub struct Unit(pub(crate) BoxedUnit);

impl Unit {
    pub fn handler(handler: impl Handler) -> Self {
        Self(handler.into_boxed_unit())
    }

    pub fn middleware(middleware: impl Middleware) -> Self {
        Self(middleware.into_boxed_unit())
    }
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The rest of a pipeline, handed to each middleware.
pub struct Next {
    stack: Arc<[BoxedUnit]>,
    index: usize,
}

impl Next {
    pub(crate) fn new(stack: Arc<[BoxedUnit]>) -> Self {
        Self { stack, index: 0 }
    }

    /// Runs the remaining units. A pipeline that runs out of units without
    /// any of them answering yields `404 Not Found`.
    pub fn run(mut self, req: Request) -> BoxFuture {
        match self.stack.get(self.index).cloned() {
            Some(unit) => {
                self.index += 1;
                unit.call(req, self)
            }
            None => Box::pin(async { Response::status(Status::NotFound) }),
        }
    }
}
