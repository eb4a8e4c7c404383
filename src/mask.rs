//! Response masks.
//!
//! A mask lists which parts of a payload go on the wire. It is written as
//! plain JSON in the route descriptor and compiled once, at assembly, into a
//! [`MaskSpec`]:
//!
//! ```text
//! "number"                          → Primitive("number")
//! {"name": "string", "age": "number"} → ObjectShape { name, age }
//! [{"name": "string"}]              → ArrayOf(ObjectShape { name })
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::Error;

#[derive(Clone, Debug, PartialEq)]
pub enum MaskSpec {
    /// Leaves the value as is; the type name only matters to the schema check
    /// that follows masking.
    Primitive(String),
    ObjectShape(BTreeMap<String, MaskSpec>),
    ArrayOf(Box<MaskSpec>),
}

impl MaskSpec {
    /// Compiles raw mask configuration.
    pub fn compile(raw: &Value) -> Result<Self, Error> {
        match raw {
            Value::String(name) => Ok(Self::Primitive(name.clone())),
            Value::Object(fields) => fields
                .iter()
                .map(|(key, sub)| Ok::<_, Error>((key.clone(), Self::compile(sub)?)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Self::ObjectShape),
            Value::Array(items) => match items.as_slice() {
                [item] => Ok(Self::ArrayOf(Box::new(Self::compile(item)?))),
                _ => Err(Error::config(format!(
                    "mask arrays take exactly one element, got {}",
                    items.len()
                ))),
            },
            other => Err(Error::config(format!("invalid mask `{other}`"))),
        }
    }

    /// Projects `payload` onto the mask.
    ///
    /// Object shapes keep only declared keys the payload actually has; a
    /// payload of the wrong shape is returned unchanged.
    pub fn apply(&self, payload: &Value) -> Value {
        match (self, payload) {
            (Self::ObjectShape(fields), Value::Object(object)) => {
                let kept: Map<String, Value> = object
                    .iter()
                    .filter_map(|(key, value)| {
                        let sub = fields.get(key)?;
                        Some((key.clone(), sub.apply(value)))
                    })
                    .collect();
                Value::Object(kept)
            }
            (Self::ArrayOf(element), Value::Array(items)) => {
                Value::Array(items.iter().map(|item| element.apply(item)).collect())
            }
            _ => payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mask(raw: Value, payload: Value) -> Value {
        MaskSpec::compile(&raw).unwrap().apply(&payload)
    }

    #[test]
    fn objects_keep_declared_keys() {
        assert_eq!(
            mask(json!({"one": "number", "two": "number"}), json!({"one": 1, "two": 2, "three": 3})),
            json!({"one": 1, "two": 2}),
        );
    }

    #[test]
    fn arrays_mask_every_element() {
        let people = json!([
            {"name": "John", "surname": "Williams", "age": 45},
            {"name": "Jack", "surname": "Black", "age": 32}
        ]);
        assert_eq!(
            mask(json!([{"name": "string", "age": "number"}]), people),
            json!([{"name": "John", "age": 45}, {"name": "Jack", "age": 32}]),
        );
    }

    #[test]
    fn nested_shapes_recurse() {
        assert_eq!(
            mask(
                json!({"user": {"id": "number"}, "tags": ["string"]}),
                json!({"user": {"id": 1, "password": "x"}, "tags": ["a"], "secret": true}),
            ),
            json!({"user": {"id": 1}, "tags": ["a"]}),
        );
    }

    #[test]
    fn missing_keys_are_not_invented() {
        assert_eq!(mask(json!({"a": "number", "b": "number"}), json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn mismatched_shapes_pass_through() {
        assert_eq!(mask(json!({"a": "number"}), json!([1, 2])), json!([1, 2]));
        assert_eq!(mask(json!(["number"]), json!({"a": 1})), json!({"a": 1}));
        assert_eq!(mask(json!("string"), json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn compile_rejects_other_shapes() {
        assert!(MaskSpec::compile(&json!(42)).is_err());
        assert!(MaskSpec::compile(&json!(["string", "number"])).is_err());
        assert!(MaskSpec::compile(&json!({"a": [true]})).is_err());
    }
}
