//! Response masking step.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::handler::{BoxFuture, ErasedUnit, Next};
use crate::logger::Logger;
use crate::mask::MaskSpec;
use crate::request::Request;
use crate::response::Envelope;
use crate::typology::SchemaValidator;

/// Masks the `result` of success envelopes coming back down the pipeline.
///
/// The masked result is checked against the raw mask used as a schema; a
/// mismatch is logged as a warning and the masked result is sent anyway.
pub(crate) struct Mask {
    spec: Arc<MaskSpec>,
    schema: Arc<Value>,
    validator: Arc<dyn SchemaValidator>,
    logger: Arc<dyn Logger>,
}

impl Mask {
    pub(crate) fn new(
        spec: MaskSpec,
        schema: Value,
        validator: Arc<dyn SchemaValidator>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self { spec: Arc::new(spec), schema: Arc::new(schema), validator, logger }
    }
}

impl ErasedUnit for Mask {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let spec = Arc::clone(&self.spec);
        let schema = Arc::clone(&self.schema);
        let validator = Arc::clone(&self.validator);
        let logger = Arc::clone(&self.logger);
        let fut = next.run(req);

        Box::pin(async move {
            let mut res = fut.await;
            if let Some(Envelope::Success { result: Some(payload), .. }) = res.envelope_mut() {
                let masked = spec.apply(payload);
                if !validator.check(&schema, &masked) {
                    logger.warn(
                        "masked payload does not match its mask",
                        &json!({"mask": &*schema, "payload": &*payload}),
                    );
                }
                *payload = masked;
            }
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::handler::Unit;
    use crate::method::Method;
    use crate::response::Response;
    use crate::typology::Typology;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Value>>);

    impl Logger for Recorder {
        fn warn(&self, _message: &str, context: &Value) {
            self.0.lock().unwrap().push(context.clone());
        }
        fn error(&self, _message: &str, _context: &Value) {}
    }

    async fn run(raw: Value, res: Response, logger: Arc<Recorder>) -> Response {
        let step = Mask::new(MaskSpec::compile(&raw).unwrap(), raw, Arc::new(Typology::new()), logger);
        let stack: Arc<[_]> = vec![
            Arc::new(step) as crate::handler::BoxedUnit,
            Unit::handler(move |_req: Request| {
                let res = res.clone();
                async move { res }
            })
            .0,
        ]
        .into();
        Next::new(stack).run(Request::new(Method::Get, "/")).await
    }

    #[tokio::test]
    async fn success_results_are_masked() {
        let logger = Arc::new(Recorder::default());
        let res = run(
            json!({"one": "number", "two": "number"}),
            Response::ok(json!({"one": 1, "two": 2, "three": 3})),
            Arc::clone(&logger),
        )
        .await;
        assert_eq!(res.body_json().unwrap()["result"], json!({"one": 1, "two": 2}));
        assert!(logger.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatch_warns_but_still_sends() {
        let logger = Arc::new(Recorder::default());
        let res = run(
            json!({"one": "number", "two": "string"}),
            Response::ok(json!({"one": 1, "two": 2})),
            Arc::clone(&logger),
        )
        .await;
        assert_eq!(res.body_json().unwrap()["result"], json!({"one": 1, "two": 2}));

        let warnings = logger.0.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0]["payload"], json!({"one": 1, "two": 2}));
        assert_eq!(warnings[0]["mask"], json!({"one": "number", "two": "string"}));
    }

    #[tokio::test]
    async fn error_envelopes_are_untouched() {
        let logger = Arc::new(Recorder::default());
        let res = run(json!({"one": "number"}), Response::not_found(None), Arc::clone(&logger)).await;
        assert_eq!(res.code(), 404);
        assert!(logger.0.lock().unwrap().is_empty());
    }
}
