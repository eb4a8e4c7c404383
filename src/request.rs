//! Incoming HTTP request type.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::method::Method;

/// An incoming HTTP request.
///
/// The server builds one per hyper request; tests and embedders can build one
/// by hand with [`Request::new`] and feed it to
/// [`Router::dispatch`](crate::Router::dispatch).
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// A request for `uri` (path plus optional `?query`), no headers, no body.
    ///
    /// ```rust
    /// use dolman::{Method, Request};
    ///
    /// let req = Request::new(Method::Get, "/two?title=world");
    /// assert_eq!(req.path(), "/two");
    /// assert_eq!(req.query_param("title").as_deref(), Some("world"));
    /// ```
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        Self {
            method,
            path: path.to_owned(),
            query: query.to_owned(),
            headers: Vec::new(),
            body: Vec::new(),
            params: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialises `value` as the body and sets `content-type: application/json`.
    pub fn with_json(self, value: &Value) -> Self {
        self.with_header("content-type", "application/json")
            .with_body(value.to_string())
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query_string(&self) -> &str { &self.query }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns a decoded query-string parameter. Repeated keys: last one wins.
    pub fn query_param(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .filter(|(k, _)| k == key)
            .last()
            .map(|(_, v)| v.into_owned())
    }

    /// Path parameters as a JSON object of strings.
    pub fn params_json(&self) -> Value {
        let map: Map<String, Value> = self.params.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }

    /// Query-string parameters as a JSON object of strings. Always an object,
    /// empty when the request has no query string.
    pub fn query_json(&self) -> Value {
        let map: Map<String, Value> = url::form_urlencoded::parse(self.query.as_bytes())
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        Value::Object(map)
    }

    /// The body parsed as JSON. `None` when the body is empty or not JSON.
    pub fn body_json(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    pub(crate) fn extend_params(&mut self, params: impl IntoIterator<Item = (String, String)>) {
        self.params.extend(params);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn query_is_decoded_into_an_object() {
        let req = Request::new(Method::Get, "/search?title=hello%20world&page=2");
        assert_eq!(req.query_json(), json!({"title": "hello world", "page": "2"}));
        assert_eq!(req.query_param("page").as_deref(), Some("2"));
    }

    #[test]
    fn missing_query_is_an_empty_object() {
        let req = Request::new(Method::Get, "/search");
        assert_eq!(req.query_json(), json!({}));
        assert_eq!(req.query_string(), "");
    }

    #[test]
    fn body_json_ignores_empty_and_invalid_bodies() {
        assert_eq!(Request::new(Method::Post, "/").body_json(), None);
        assert_eq!(Request::new(Method::Post, "/").with_body("{nope").body_json(), None);

        let req = Request::new(Method::Post, "/").with_json(&json!({"text": "world"}));
        assert_eq!(req.body_json(), Some(json!({"text": "world"})));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
    }
}
