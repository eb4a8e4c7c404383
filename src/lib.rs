//! # dolman
//!
//! Declarative routes over a small HTTP dispatch framework.
//!
//! A route is data: a URL, the methods it answers, an action, and the
//! optional steps wrapped around it. [`Dolman::router`] turns a list of
//! [`RouteDescriptor`]s into a mountable [`Router`] whose every pipeline is
//!
//! ```text
//! validate → mask → ram cache → http cache → action
//! ```
//!
//! with each step present only when the descriptor asks for it. Responses
//! are JSON envelopes (`{"status":"ok","code":200,"result":…}` /
//! `{"status":"error","code":400,"error":{…}}`), and [`Dolman::specs`] walks
//! the fully mounted router to describe every named route at its public path.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use dolman::{Dolman, Request, Response, RouteDescriptor, Router, Server, ValidationSpec};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dolman::Error> {
//!     let dolman = Dolman::new();
//!
//!     let users = dolman.router(vec![
//!         RouteDescriptor::new("/:id")
//!             .name("user")
//!             .validate(ValidationSpec::default().params(json!({"id": "string"})))
//!             .mask(json!({"id": "string", "name": "string"}))
//!             .cache("users")
//!             .http_cache(dolman::HttpCacheSpec::hours(1))
//!             .action(get_user),
//!     ])?;
//!
//!     let app = Router::new().mount("/users", users);
//!     let specs = dolman.specs(&app);
//!     println!("{}", serde_json::to_string_pretty(&specs).unwrap_or_default());
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     Response::ok(json!({"id": req.param("id"), "name": "alice", "password": "hunter2"}))
//! }
//! ```

mod cache;
mod config;
mod descriptor;
mod dolman;
mod error;
mod handler;
mod logger;
mod mask;
mod method;
mod pattern;
mod registry;
mod request;
mod response;
mod router;
mod server;
mod spec;
mod status;
mod typology;

pub mod middleware;

pub use cache::{CacheStore, Payload};
pub use config::Config;
pub use descriptor::{
    CacheDuration, CacheSpec, Hasher, HttpCacheSpec, NO_HASH, RouteDescriptor, RouteOptions,
    ValidationSpec,
};
pub use dolman::Dolman;
pub use error::Error;
pub use handler::{BoxFuture, BoxedUnit, ErasedUnit, Handler, Middleware, Next, Unit};
pub use logger::{Logger, NoopLogger, TracingLogger};
pub use mask::MaskSpec;
pub use method::Method;
pub use pattern::{demangle, join};
pub use registry::{RouteId, RouteRegistry};
pub use request::Request;
pub use response::{Envelope, ErrorDetail, IntoResponse, Response};
pub use router::{Methods, Router};
pub use server::Server;
pub use spec::{DispatchNode, Segment, SpecDocument, SpecEntry, SpecExtractor};
pub use status::Status;
pub use typology::{SchemaValidator, Typology};
