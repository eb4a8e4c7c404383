//! Request validation step.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::descriptor::ValidationSpec;
use crate::handler::{BoxFuture, ErasedUnit, Next};
use crate::request::Request;
use crate::response::Response;
use crate::typology::SchemaValidator;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Source {
    Params,
    Query,
    Body,
}

impl Source {
    /// Checking order.
    const ALL: [Source; 3] = [Self::Params, Self::Query, Self::Body];

    fn as_str(self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::Query  => "query",
            Self::Body   => "body",
        }
    }

    fn value(self, req: &Request) -> Option<Value> {
        match self {
            Self::Params => Some(req.params_json()),
            Self::Query  => Some(req.query_json()),
            Self::Body   => req.body_json(),
        }
    }
}

/// Checks params, query and body, in that order, against their schemas.
/// The first failure answers `400` with a reason; later parts go unchecked.
pub(crate) struct Validate {
    spec: ValidationSpec,
    url: Arc<str>,
    validator: Arc<dyn SchemaValidator>,
}

impl Validate {
    pub(crate) fn new(spec: ValidationSpec, url: &str, validator: Arc<dyn SchemaValidator>) -> Self {
        Self { spec, url: url.into(), validator }
    }

    fn schema(&self, source: Source) -> Option<&Value> {
        match source {
            Source::Params => self.spec.params.as_ref(),
            Source::Query  => self.spec.query.as_ref(),
            Source::Body   => self.spec.body.as_ref(),
        }
    }

    /// The reason of the first failing part, if any.
    fn failure(&self, req: &Request) -> Option<Value> {
        Source::ALL.into_iter().find_map(|source| {
            let schema = self.schema(source)?;
            let value = source.value(req);
            if self.validator.check(schema, value.as_ref().unwrap_or(&Value::Null)) {
                return None;
            }
            let mut reason = json!({
                "source": source.as_str(),
                "expecting": schema,
                "sent": value.unwrap_or_else(|| json!({})),
            });
            if source == Source::Params {
                reason["path"] = Value::String(self.url.to_string());
            }
            Some(reason)
        })
    }
}

impl ErasedUnit for Validate {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        match self.failure(&req) {
            Some(reason) => Box::pin(async move { Response::bad_request(Some(reason)) }),
            None => next.run(req),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::typology::Typology;

    fn validate(spec: ValidationSpec) -> Validate {
        let types = Typology::new().with_type("custom", |v| v == "custom");
        Validate::new(spec, "/url/:id", Arc::new(types))
    }

    fn with_id(uri: &str, id: &str) -> Request {
        let mut req = Request::new(Method::Get, uri);
        req.extend_params([("id".to_owned(), id.to_owned())]);
        req
    }

    #[test]
    fn params_fail_first_and_report_the_path() {
        let step = validate(
            ValidationSpec::default()
                .params(json!({"id": "custom"}))
                .query(json!({"title": "string"})),
        );
        let reason = step.failure(&with_id("/url/shawarma", "shawarma")).unwrap();
        assert_eq!(reason, json!({
            "source": "params",
            "path": "/url/:id",
            "expecting": {"id": "custom"},
            "sent": {"id": "shawarma"}
        }));
    }

    #[test]
    fn query_failure_has_no_path() {
        let step = validate(
            ValidationSpec::default()
                .params(json!({"id": "custom"}))
                .query(json!({"title": "string"})),
        );
        let reason = step.failure(&with_id("/url/custom", "custom")).unwrap();
        assert_eq!(reason, json!({
            "source": "query",
            "expecting": {"title": "string"},
            "sent": {}
        }));
    }

    #[test]
    fn missing_body_is_sent_as_empty_object() {
        let step = validate(ValidationSpec::default().body(json!({"text": "string"})));
        let reason = step.failure(&Request::new(Method::Post, "/url/custom")).unwrap();
        assert_eq!(reason["source"], "body");
        assert_eq!(reason["sent"], json!({}));
    }

    #[test]
    fn passing_requests_have_no_failure() {
        let step = validate(
            ValidationSpec::default()
                .params(json!({"id": "custom"}))
                .body(json!({"text": "string", "number": "?number"})),
        );
        let req = with_id("/url/custom", "custom").with_json(&json!({"text": "world"}));
        assert!(step.failure(&req).is_none());
    }
}
