//! Outgoing HTTP response type, JSON envelopes, and the [`IntoResponse`]
//! conversion trait.
//!
//! Handlers answer with one of the envelope shortcuts:
//!
//! ```text
//! { "status": "ok",    "code": 200, "result": … }
//! { "status": "error", "code": 400, "error": { "message": "Bad Request", "reason": … } }
//! ```
//!
//! Envelope responses keep their payload structured until the response is
//! written, so pipeline steps (masking, RAM caching) can inspect and rewrite
//! the `result` after the handler has returned.

use bytes::Bytes;
use http_body_util::Full;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::error;

use crate::status::Status;

// ── Envelope ──────────────────────────────────────────────────────────────────

/// The standard JSON body of dolman responses.
#[derive(Clone, Debug, PartialEq)]
pub enum Envelope {
    /// `{ status: "ok", code, result? }`, sent by [`Response::ok`] and
    /// [`Response::created`].
    Success { code: u16, result: Option<Value> },
    /// `{ status: "error", code, error: { message, reason?, expecting? } }`.
    Failure { code: u16, error: ErrorDetail },
}

/// The `error` member of a failure envelope.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expecting: Option<Value>,
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::Success { code, result } => {
                map.serialize_entry("status", "ok")?;
                map.serialize_entry("code", code)?;
                if let Some(result) = result {
                    map.serialize_entry("result", result)?;
                }
            }
            Self::Failure { code, error } => {
                map.serialize_entry("status", "error")?;
                map.serialize_entry("code", code)?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub(crate) enum Body {
    Bytes(Vec<u8>),
    Envelope(Envelope),
}

/// An outgoing HTTP response.
///
/// # Envelopes
///
/// ```rust
/// use dolman::Response;
/// use serde_json::json;
///
/// Response::ok(json!({"id": 1}));
/// Response::created(json!({"id": 42}));
/// Response::bad_request(Some(json!({"source": "body"})));
/// Response::not_found(None);
/// ```
///
/// # Raw bodies
///
/// ```rust
/// use dolman::{Response, Status};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(Status::NoContent);
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    pub(crate) body: Body,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: u16,
}

impl Response {
    /// `200` success envelope. A `None` result omits the `result` key.
    pub fn ok(result: impl Into<Option<Value>>) -> Self {
        Self::success(Status::Ok, result.into())
    }

    /// `201` success envelope.
    pub fn created(result: impl Into<Option<Value>>) -> Self {
        Self::success(Status::Created, result.into())
    }

    /// `304 Not Modified`, no body.
    pub fn not_modified() -> Self {
        Self::status(Status::NotModified)
    }

    /// `400` error envelope with an optional structured reason.
    pub fn bad_request(reason: Option<Value>) -> Self {
        Self::failure(Status::BadRequest, reason)
    }

    pub fn unauthorized() -> Self {
        Self::failure(Status::Unauthorized, None)
    }

    pub fn forbidden() -> Self {
        Self::failure(Status::Forbidden, None)
    }

    /// `404` error envelope with an optional structured reason.
    pub fn not_found(reason: Option<Value>) -> Self {
        Self::failure(Status::NotFound, reason)
    }

    /// `500` error envelope. Logging the cause is the caller's job; see
    /// [`Dolman::server_error`](crate::Dolman::server_error).
    pub fn internal_error() -> Self {
        Self::failure(Status::InternalServerError, None)
    }

    /// `200 OK`, `application/json`, raw bytes from your serialiser.
    pub fn json(body: Vec<u8>) -> Self {
        Self::bytes_raw("application/json", body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::bytes_raw("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self { body: Body::Bytes(Vec::new()), headers: Vec::new(), status: code.into() }
    }

    fn success(status: Status, result: Option<Value>) -> Self {
        let code = status.into();
        Self::enveloped(code, Envelope::Success { code, result })
    }

    fn failure(status: Status, reason: Option<Value>) -> Self {
        let code = status.into();
        let error = ErrorDetail { message: status.reason().to_owned(), reason, expecting: None };
        Self::enveloped(code, Envelope::Failure { code, error })
    }

    fn enveloped(code: u16, envelope: Envelope) -> Self {
        Self {
            body: Body::Envelope(envelope),
            headers: vec![("content-type".to_owned(), "application/json".to_owned())],
            status: code,
        }
    }

    fn bytes_raw(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            body: Body::Bytes(body),
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            status: Status::Ok.into(),
        }
    }

    pub fn code(&self) -> u16 { self.status }

    /// First header value named `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing value of the same name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    /// The structured envelope, if this response carries one.
    pub fn envelope(&self) -> Option<&Envelope> {
        match &self.body {
            Body::Envelope(envelope) => Some(envelope),
            Body::Bytes(_) => None,
        }
    }

    pub(crate) fn envelope_mut(&mut self) -> Option<&mut Envelope> {
        match &mut self.body {
            Body::Envelope(envelope) => Some(envelope),
            Body::Bytes(_) => None,
        }
    }

    /// The body bytes as they go on the wire.
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            Body::Bytes(bytes) => bytes.clone(),
            Body::Envelope(envelope) => serde_json::to_vec(envelope).unwrap_or_else(|e| {
                error!("envelope serialisation failed: {e}");
                Vec::new()
            }),
        }
    }

    /// The body parsed as JSON, for inspection in tests and middleware.
    pub fn body_json(&self) -> Option<Value> {
        match &self.body {
            Body::Bytes(bytes) => serde_json::from_slice(bytes).ok(),
            Body::Envelope(envelope) => serde_json::to_value(envelope).ok(),
        }
    }

    /// Converts into the `http` type hyper writes to the connection.
    ///
    /// Headers with names or values `http` refuses are dropped with an error
    /// log rather than failing the whole response.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let body = self.body_bytes();
        let mut res = http::Response::new(Full::new(Bytes::from(body)));
        *res.status_mut() = http::StatusCode::from_u16(self.status)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        for (name, value) in &self.headers {
            match (
                http::header::HeaderName::from_bytes(name.as_bytes()),
                http::header::HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    res.headers_mut().append(name, value);
                }
                _ => error!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`Status`] directly from a handler: `return Status::NotFound`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

/// A bare JSON value is sent as a `200` success envelope.
impl IntoResponse for Value {
    fn into_response(self) -> Response { Response::ok(self) }
}
