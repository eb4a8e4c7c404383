//! Route specs recovered from a live dispatch tree.
//!
//! Once every router is mounted, the application is a tree: routers contain
//! mounts and routes, routes contain their pipeline units. Walking it from the
//! root, accumulating path fragments on the way down, gives each leaf its
//! full public path. Leaves that are the registry shim of a declared route
//! resolve back to their [`RouteDescriptor`](crate::RouteDescriptor), and
//! the named ones end up in a [`SpecDocument`]:
//!
//! ```json
//! {
//!   "formats": ["json"],
//!   "methods": {
//!     "goodbye": { "path": "/nested/goodbye", "name": "goodbye", "method": "GET" }
//!   }
//! }
//! ```
//!
//! The walk only depends on [`DispatchNode`], so anything that can describe
//! itself as such a tree can be extracted.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::handler::ErasedUnit;
use crate::pattern;
use crate::registry::RouteRegistry;

/// The path fragment a node contributes.
#[derive(Clone, Copy, Debug)]
pub enum Segment<'a> {
    /// A route pattern, kept as written (`/url/:id`).
    Literal(&'a str),
    /// A compiled mount prefix, demangled back to its literal form.
    Pattern(&'a Regex),
}

/// Read-only view of one node of a dispatch tree.
///
/// Internal nodes expose an optional segment and their children; leaves
/// expose the handler they are bound to.
pub trait DispatchNode {
    fn segment(&self) -> Option<Segment<'_>>;

    fn children(&self) -> Vec<&dyn DispatchNode>;

    fn handler(&self) -> Option<&dyn ErasedUnit> {
        None
    }
}

/// One named route.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SpecEntry {
    pub path: String,
    pub name: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The declarative description of every named route, keyed by name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SpecDocument {
    pub formats: Vec<String>,
    pub methods: BTreeMap<String, SpecEntry>,
}

impl Default for SpecDocument {
    fn default() -> Self {
        Self { formats: vec!["json".to_owned()], methods: BTreeMap::new() }
    }
}

/// Walks a dispatch tree and resolves its leaves through a registry.
pub struct SpecExtractor<'r> {
    registry: &'r RouteRegistry,
}

impl<'r> SpecExtractor<'r> {
    pub fn new(registry: &'r RouteRegistry) -> Self {
        Self { registry }
    }

    /// Builds the document for the tree under `root`.
    ///
    /// Two routes sharing a name collide silently: the one visited last wins.
    pub fn extract(&self, root: &dyn DispatchNode) -> SpecDocument {
        let mut doc = SpecDocument::default();
        self.walk(root, "", &mut doc);
        doc
    }

    fn walk(&self, node: &dyn DispatchNode, prefix: &str, doc: &mut SpecDocument) {
        let path = match node.segment() {
            Some(Segment::Literal(fragment)) => pattern::join(prefix, fragment),
            Some(Segment::Pattern(regex)) => pattern::join(prefix, &pattern::demangle(regex.as_str())),
            None => prefix.to_owned(),
        };

        if let Some(entry) = node.handler().and_then(|handler| self.entry(handler, &path)) {
            trace!(name = %entry.name, path = %entry.path, "spec entry");
            doc.methods.insert(entry.name.clone(), entry);
        }

        for child in node.children() {
            self.walk(child, &path, doc);
        }
    }

    fn entry(&self, handler: &dyn ErasedUnit, path: &str) -> Option<SpecEntry> {
        let descriptor = self.registry.lookup(handler)?;
        let name = descriptor.name.clone()?;
        Some(SpecEntry {
            path: if path.is_empty() { "/".to_owned() } else { path.to_owned() },
            name,
            method: descriptor.spec_method(),
            description: descriptor.description.clone(),
        })
    }
}
