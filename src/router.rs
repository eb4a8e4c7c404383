//! Mountable request router.
//!
//! One radix tree per HTTP method plus one for routes that accept every
//! method, O(path-length) lookup via [`matchit`]. Routers nest: a router can
//! be mounted under a prefix inside another one, the way an application is
//! assembled from per-resource routers.
//!
//! Lookup honours registration order the way a middleware stack does: a
//! mount registered before a matching route gets the first chance to answer.
//!
//! The router is also a read-only [`DispatchNode`] tree, which is what the
//! spec extractor walks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use regex::Regex;

use crate::error::Error;
use crate::handler::{BoxedUnit, ErasedUnit, Handler, Next};
use crate::method::Method;
use crate::pattern::{self, REST_GROUP};
use crate::request::Request;
use crate::response::Response;
use crate::spec::{DispatchNode, Segment};
use crate::status::Status;

/// Which methods a route answers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Methods {
    /// Every method; the wildcard a descriptor gets when it names none.
    All,
    Only(Vec<Method>),
}

pub(crate) struct Route {
    order: usize,
    pattern: String,
    stack: Arc<[BoxedUnit]>,
}

struct Mount {
    pattern: Regex,
    router: Router,
}

enum Layer {
    Route(Arc<Route>),
    Mount(Mount),
}

type Params = Vec<(String, String)>;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Registration methods return `self` so calls chain naturally.
#[derive(Default)]
pub struct Router {
    layers: Vec<Layer>,
    trees: HashMap<Method, MatchitRouter<Arc<Route>>>,
    wildcard: MatchitRouter<Arc<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `:name` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust
    /// # use dolman::{Method, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::ok(None) }
    /// # async fn create_user(_: Request) -> Response { Response::ok(None) }
    /// Router::new()
    ///     .on(Method::Get,  "/users/:id", get_user)
    ///     .on(Method::Post, "/users",     create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the path is malformed or conflicts with an existing route
    /// for the same method.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(Methods::Only(vec![method]), path, vec![handler.into_boxed_unit()])
            .unwrap_or_else(|e| panic!("{e}"));
        self
    }

    /// Mounts `router` under `prefix`. Requests whose path starts with the
    /// prefix are handed to it with the prefix stripped; `:name` segments in
    /// the prefix become path parameters.
    ///
    /// # Panics
    ///
    /// Panics if the prefix cannot be compiled; see [`Router::try_mount`].
    pub fn mount(self, prefix: &str, router: Router) -> Self {
        self.try_mount(prefix, router).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible [`Router::mount`].
    pub fn try_mount(mut self, prefix: &str, router: Router) -> Result<Self, Error> {
        let pattern = pattern::compile_mount(prefix)
            .map_err(|e| Error::config(format!("invalid mount prefix `{prefix}`: {e}")))?;
        self.layers.push(Layer::Mount(Mount { pattern, router }));
        Ok(self)
    }

    /// Registers a pipeline under `path` for `methods`.
    pub(crate) fn add(
        &mut self,
        methods: Methods,
        path: &str,
        stack: Vec<BoxedUnit>,
    ) -> Result<(), Error> {
        let route = Arc::new(Route {
            order: self.layers.len(),
            pattern: path.to_owned(),
            stack: stack.into(),
        });
        let key = pattern::to_matchit(path);
        let invalid = |e: matchit::InsertError| Error::config(format!("invalid route `{path}`: {e}"));

        match &methods {
            Methods::All => self.wildcard.insert(key, Arc::clone(&route)).map_err(invalid)?,
            Methods::Only(list) => {
                for method in list {
                    self.trees
                        .entry(*method)
                        .or_default()
                        .insert(key.clone(), Arc::clone(&route))
                        .map_err(invalid)?;
                }
            }
        }
        self.layers.push(Layer::Route(route));
        Ok(())
    }

    /// Routes one request and runs the matched pipeline.
    ///
    /// Unmatched requests get `404 Not Found` with no body.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let path = req.path.clone();
        match self.find(req.method, &path) {
            Some((route, params)) => {
                req.extend_params(params);
                Next::new(Arc::clone(&route.stack)).run(req).await
            }
            None => Response::status(Status::NotFound),
        }
    }

    fn find(&self, method: Method, path: &str) -> Option<(Arc<Route>, Params)> {
        let own = self.find_route(method, path);
        let before = own.as_ref().map_or(self.layers.len(), |(route, _)| route.order);

        for layer in &self.layers[..before] {
            let Layer::Mount(mount) = layer else { continue };
            let Some(caps) = mount.pattern.captures(path) else { continue };
            let rest = caps.name(REST_GROUP).map_or("/", |m| m.as_str());
            if let Some((route, mut params)) = mount.router.find(method, rest) {
                params.extend(
                    mount.pattern.capture_names()
                        .flatten()
                        .filter(|name| *name != REST_GROUP)
                        .filter_map(|name| Some((name.to_owned(), caps.name(name)?.as_str().to_owned()))),
                );
                return Some((route, params));
            }
        }
        own
    }

    /// Matches `path` in this router's own trees. A single trailing slash is
    /// ignored, and `HEAD` falls back to the `GET` routes.
    fn find_route(&self, method: Method, path: &str) -> Option<(Arc<Route>, Params)> {
        self.lookup(method, path).or_else(|| {
            let trimmed = path.strip_suffix('/').filter(|p| !p.is_empty())?;
            self.lookup(method, trimmed)
        })
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(Arc<Route>, Params)> {
        let specific = self.at(method, path).or_else(|| {
            if method == Method::Head { self.at(Method::Get, path) } else { None }
        });
        let any = self.wildcard.at(path).ok();
        let matched = match (specific, any) {
            (Some(a), Some(b)) => if a.value.order <= b.value.order { a } else { b },
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => return None,
        };
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((Arc::clone(matched.value), params))
    }

    fn at<'a>(&'a self, method: Method, path: &'a str) -> Option<matchit::Match<'a, 'a, &'a Arc<Route>>> {
        self.trees.get(&method)?.at(path).ok()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("layers", &self.layers).finish()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route(route) => f.debug_tuple("Route").field(&route.pattern).finish(),
            Self::Mount(mount) => f
                .debug_struct("Mount")
                .field("prefix", &pattern::demangle(mount.pattern.as_str()))
                .field("router", &mount.router)
                .finish(),
        }
    }
}

// ── Dispatch tree view ────────────────────────────────────────────────────────

impl DispatchNode for Router {
    fn segment(&self) -> Option<Segment<'_>> {
        None
    }

    fn children(&self) -> Vec<&dyn DispatchNode> {
        self.layers.iter().map(|layer| layer as &dyn DispatchNode).collect()
    }
}

impl DispatchNode for Layer {
    fn segment(&self) -> Option<Segment<'_>> {
        match self {
            Self::Route(route) => Some(Segment::Literal(&route.pattern)),
            Self::Mount(mount) => Some(Segment::Pattern(&mount.pattern)),
        }
    }

    fn children(&self) -> Vec<&dyn DispatchNode> {
        match self {
            Self::Route(route) => route.stack.iter().map(|unit| unit as &dyn DispatchNode).collect(),
            Self::Mount(mount) => vec![&mount.router as &dyn DispatchNode],
        }
    }
}

impl DispatchNode for BoxedUnit {
    fn segment(&self) -> Option<Segment<'_>> {
        None
    }

    fn children(&self) -> Vec<&dyn DispatchNode> {
        Vec::new()
    }

    fn handler(&self) -> Option<&dyn ErasedUnit> {
        Some(&**self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::handler::Unit;

    async fn user(req: Request) -> Response {
        Response::ok(json!({"id": req.param("id"), "org": req.param("org")}))
    }

    async fn named(req: Request) -> Response {
        Response::ok(json!({"path": req.path()}))
    }

    fn units(handler: impl Handler) -> Vec<BoxedUnit> {
        vec![Unit::handler(handler).0]
    }

    #[tokio::test]
    async fn routes_are_per_method() {
        let app = Router::new().on(Method::Post, "/post", named);
        assert_eq!(app.dispatch(Request::new(Method::Post, "/post")).await.code(), 200);
        assert_eq!(app.dispatch(Request::new(Method::Get, "/post")).await.code(), 404);
    }

    #[tokio::test]
    async fn wildcard_routes_accept_every_method() {
        let mut app = Router::new();
        app.add(Methods::All, "/any", units(named)).unwrap();
        for method in [Method::Get, Method::Delete, Method::Patch] {
            assert_eq!(app.dispatch(Request::new(method, "/any")).await.code(), 200);
        }
    }

    #[tokio::test]
    async fn mounted_routers_see_prefix_params() {
        let users = Router::new().on(Method::Get, "/users/:id", user);
        let app = Router::new().mount("/orgs/:org", users);
        let res = app.dispatch(Request::new(Method::Get, "/orgs/acme/users/7")).await;
        assert_eq!(res.body_json().unwrap()["result"], json!({"id": "7", "org": "acme"}));
    }

    #[tokio::test]
    async fn mount_prefix_must_end_at_a_segment() {
        let inner = Router::new().on(Method::Get, "/x", named);
        let app = Router::new().mount("/nested", inner);
        assert_eq!(app.dispatch(Request::new(Method::Get, "/nested/x")).await.code(), 200);
        assert_eq!(app.dispatch(Request::new(Method::Get, "/nestedx")).await.code(), 404);
    }

    #[tokio::test]
    async fn earlier_layers_win() {
        let mut first = Router::new();
        first.add(Methods::All, "/dup", units(|_req: Request| async { Response::ok(json!(1)) })).unwrap();
        let app = Router::new()
            .mount("/", first)
            .on(Method::Get, "/dup", |_req: Request| async { Response::ok(json!(2)) });
        let res = app.dispatch(Request::new(Method::Get, "/dup")).await;
        assert_eq!(res.body_json().unwrap()["result"], json!(1));
    }

    #[tokio::test]
    async fn head_falls_back_to_get() {
        let app = Router::new()
            .on(Method::Get, "/hello", named)
            .on(Method::Head, "/own", |_req: Request| async { Response::status(Status::NoContent) })
            .on(Method::Get, "/own", named);
        assert_eq!(app.dispatch(Request::new(Method::Head, "/hello")).await.code(), 200);
        assert_eq!(app.dispatch(Request::new(Method::Head, "/own")).await.code(), 204);
        assert_eq!(app.dispatch(Request::new(Method::Post, "/hello")).await.code(), 404);
    }

    #[tokio::test]
    async fn one_trailing_slash_is_ignored() {
        let inner = Router::new().on(Method::Get, "/x", named);
        let app = Router::new()
            .on(Method::Get, "/hello", named)
            .mount("/nested", inner);
        assert_eq!(app.dispatch(Request::new(Method::Get, "/hello/")).await.code(), 200);
        assert_eq!(app.dispatch(Request::new(Method::Get, "/nested/x/")).await.code(), 200);
        assert_eq!(app.dispatch(Request::new(Method::Get, "/hello//")).await.code(), 404);
    }

    #[test]
    fn debug_lists_routes_and_mounts() {
        let inner = Router::new().on(Method::Get, "/goodbye", named);
        let app = Router::new()
            .on(Method::Get, "/hello", named)
            .mount("/nested/:id", inner);
        let shown = format!("{app:?}");
        assert!(shown.contains("Route(\"/hello\")"), "{shown}");
        assert!(shown.contains("prefix: \"/nested/:id\""), "{shown}");
        assert!(shown.contains("Route(\"/goodbye\")"), "{shown}");
    }

    #[test]
    fn conflicting_routes_are_rejected() {
        let mut app = Router::new();
        app.add(Methods::Only(vec![Method::Get]), "/a", units(named)).unwrap();
        let err = app.add(Methods::Only(vec![Method::Get]), "/a", units(named)).unwrap_err();
        assert!(err.config_message().unwrap().contains("invalid route `/a`"));
    }

    #[test]
    fn tree_view_exposes_segments_and_leaves() {
        let inner = Router::new().on(Method::Get, "/hello", named);
        let app = Router::new().mount("/nested", inner);

        let mounts = app.children();
        assert_eq!(mounts.len(), 1);
        let Some(Segment::Pattern(re)) = mounts[0].segment() else { panic!("expected a mount") };
        assert_eq!(pattern::demangle(re.as_str()), "/nested");

        let inner_router = mounts[0].children()[0];
        let route = inner_router.children()[0];
        assert!(matches!(route.segment(), Some(Segment::Literal("/hello"))));
        assert!(route.children()[0].handler().is_some());
    }
}
