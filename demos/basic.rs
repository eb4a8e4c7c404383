//! Minimal dolman example: declared routes, mounting, caching, specs.
//!
//! Run with:
//!   RUST_LOG=dolman=debug,info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/users/42          # served from the RAM cache
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -X POST http://localhost:3000/users -d '{"name":1}'   # 400
//!   curl http://localhost:3000/specs

use std::sync::Arc;

use dolman::{
    Config, Dolman, HttpCacheSpec, Request, Response, RouteDescriptor, Router, Server, Typology,
    ValidationSpec,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), dolman::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let dolman = Dolman::with_config(
        Config::new().types(Typology::new().with_type("userId", |v| {
            v.as_str().is_some_and(|s| s.chars().all(|c| c.is_ascii_digit()))
        })),
    );

    let users = dolman.router(vec![
        RouteDescriptor::new("/:id")
            .name("getUser")
            .description("Fetch one user")
            .validate(ValidationSpec::default().params(json!({"id": "userId"})))
            .mask(json!({"id": "string", "name": "string"}))
            .cache("users")
            .http_cache(HttpCacheSpec::minutes(5))
            .action(get_user),
        RouteDescriptor::new("/")
            .name("createUser")
            .method("post")
            .validate(ValidationSpec::default().body(json!({"name": "string"})))
            .action(create_user),
    ])?;

    let app = Router::new().mount("/users", users);

    // Specs describe the tree they are extracted from, so the specs route is
    // mounted on a second router wrapping the first.
    let specs = Arc::new(dolman.specs(&app));
    let meta = dolman.router(vec![RouteDescriptor::new("/specs").action(move |_req: Request| {
        let specs = Arc::clone(&specs);
        async move { Response::ok(serde_json::to_value(&*specs).ok()) }
    })])?;

    let app = Router::new().mount("/", app).mount("/", meta);

    Server::bind("0.0.0.0:3000").serve(app).await
}

// GET /users/:id
//
// `password` never leaves the process: the mask keeps `id` and `name` only.
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or_default();
    Response::ok(json!({"id": id, "name": "alice", "password": "hunter2"}))
}

// POST /users
async fn create_user(req: Request) -> Response {
    let Some(user) = req.body_json() else {
        return Response::bad_request(None);
    };
    Response::created(json!({"id": "99", "name": user["name"]}))
}
