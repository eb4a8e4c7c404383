//! Path patterns.
//!
//! Routes are written the Express way, `/users/:id`, and kept verbatim for
//! validation reasons and specs. Two internal representations are derived
//! from them:
//!
//! - route paths become [`matchit`] patterns (`/users/{id}`) for the
//!   per-method radix trees;
//! - mount prefixes become anchored regexes with a trailing `rest` group,
//!   so a mounted router can be handed the remainder of the path:
//!
//! ```text
//! "/nested"      → ^/nested(?P<__rest>/.*)?$
//! "/users/:uid"  → ^/users/(?P<uid>[^/]+)(?P<__rest>/.*)?$
//! "/" or ""      → ^(?P<__rest>/.*)?$            (wholesale)
//! ```
//!
//! [`demangle`] turns the regex source back into the literal prefix, which is
//! how the spec extractor recovers mount points from a live tree.

use regex::Regex;

/// Name of the capture group holding the unmatched remainder of a path.
pub(crate) const REST_GROUP: &str = "__rest";

const REST_TAIL: &str = "(?P<__rest>/.*)?$";
const PARAM_BODY: &str = ">[^/]+)";

/// Translates `/users/:id/*path` into matchit's `/users/{id}/{*path}`.
pub(crate) fn to_matchit(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                segment.replace('{', "{{").replace('}', "}}")
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Compiles a mount prefix into its anchored regex.
pub(crate) fn compile_mount(prefix: &str) -> Result<Regex, regex::Error> {
    let mut source = String::from("^");
    for segment in prefix.split('/').filter(|s| !s.is_empty()) {
        source.push('/');
        match segment.strip_prefix(':') {
            Some(name) => {
                source.push_str("(?P<");
                source.push_str(name);
                source.push_str(PARAM_BODY);
            }
            None => source.push_str(&regex::escape(segment)),
        }
    }
    source.push_str(REST_TAIL);
    Regex::new(&source)
}

/// Recovers the literal prefix a mount regex was compiled from.
///
/// Wholesale mounts demangle to the empty string. Sources that were not
/// produced by [`compile_mount`] are unescaped on a best-effort basis.
pub fn demangle(source: &str) -> String {
    let body = source.strip_prefix('^').unwrap_or(source);
    let body = body.strip_suffix(REST_TAIL).unwrap_or(body);

    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(c) = rest.chars().next() {
        if let Some(group) = rest.strip_prefix("(?P<") {
            if let Some(end) = group.find(PARAM_BODY) {
                out.push(':');
                out.push_str(&group[..end]);
                rest = &group[end + PARAM_BODY.len()..];
                continue;
            }
        }
        if c == '\\' {
            rest = &rest[1..];
            if let Some(escaped) = rest.chars().next() {
                out.push(escaped);
                rest = &rest[escaped.len_utf8()..];
            }
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Joins path fragments with exactly one `/` between them.
///
/// Empty fragments contribute nothing; a trailing slash is dropped. The
/// result is empty only when both sides are; callers render that as `/`.
pub fn join(prefix: &str, fragment: &str) -> String {
    let head = prefix.trim_end_matches('/');
    let tail = fragment.trim_matches('/');
    match (head.is_empty(), tail.is_empty()) {
        (_, true) => head.to_owned(),
        (true, false) => format!("/{tail}"),
        (false, false) => format!("{head}/{tail}"),
    }
}
