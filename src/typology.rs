//! Schema checking.
//!
//! Validation and mask checks only need one question answered: does this
//! value fit that schema? [`SchemaValidator`] is that question; [`Typology`]
//! is the built-in answer, a small structural type language over JSON:
//!
//! | schema                | accepts                                          |
//! |-----------------------|--------------------------------------------------|
//! | `"string"`, `"number"`, `"boolean"`, `"object"`, `"array"`, `"null"` | that JSON type |
//! | `"undefined"`         | a missing value                                  |
//! | `"primitive"`         | string, number or boolean                        |
//! | `"*"`                 | anything, missing included                       |
//! | `"?number"`           | a number, null, or missing                       |
//! | `"string\|number"`    | either                                           |
//! | `{"id": "string"}`    | an object with those keys, and no others         |
//! | `["number"]`          | an array whose elements all match                |
//!
//! Custom names can be registered with [`Typology::with_type`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// `check(schema, value) -> bool`.
pub trait SchemaValidator: Send + Sync {
    fn check(&self, schema: &Value, value: &Value) -> bool;
}

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// The built-in [`SchemaValidator`].
#[derive(Clone, Default)]
pub struct Typology {
    custom: HashMap<String, Predicate>,
}

impl Typology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named type. Custom names shadow nothing: built-in names
    /// are resolved first.
    ///
    /// ```rust
    /// use dolman::{SchemaValidator, Typology};
    /// use serde_json::json;
    ///
    /// let types = Typology::new().with_type("custom", |v| v == "custom");
    /// assert!(types.check(&json!({"id": "custom"}), &json!({"id": "custom"})));
    /// assert!(!types.check(&json!({"id": "custom"}), &json!({"id": "shawarma"})));
    /// ```
    pub fn with_type(
        mut self,
        name: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.custom.insert(name.into(), Arc::new(predicate));
        self
    }

    /// `value` is `None` when the checked key is missing altogether.
    fn matches(&self, schema: &Value, value: Option<&Value>) -> bool {
        match schema {
            Value::String(expr) => self.matches_expr(expr, value),
            Value::Object(fields) => match value {
                Some(Value::Object(object)) => {
                    object.keys().all(|k| fields.contains_key(k))
                        && fields.iter().all(|(k, sub)| self.matches(sub, object.get(k)))
                }
                _ => false,
            },
            Value::Array(items) => match (items.as_slice(), value) {
                ([item], Some(Value::Array(values))) => {
                    values.iter().all(|v| self.matches(item, Some(v)))
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn matches_expr(&self, expr: &str, value: Option<&Value>) -> bool {
        let (optional, expr) = match expr.strip_prefix('?') {
            Some(rest) => (true, rest),
            None => (false, expr),
        };
        if optional && matches!(value, None | Some(Value::Null)) {
            return true;
        }
        expr.split('|').any(|name| self.matches_name(name.trim(), value))
    }

    fn matches_name(&self, name: &str, value: Option<&Value>) -> bool {
        if name == "*" {
            return true;
        }
        let Some(value) = value else {
            return name == "undefined";
        };
        match name {
            "string"    => value.is_string(),
            "number"    => value.is_number(),
            "boolean"   => value.is_boolean(),
            "object"    => value.is_object(),
            "array"     => value.is_array(),
            "null"      => value.is_null(),
            "primitive" => value.is_string() || value.is_number() || value.is_boolean(),
            "undefined" => false,
            other       => self.custom.get(other).is_some_and(|predicate| predicate(value)),
        }
    }
}

impl SchemaValidator for Typology {
    fn check(&self, schema: &Value, value: &Value) -> bool {
        self.matches(schema, Some(value))
    }
}

impl fmt::Debug for Typology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typology")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn check(schema: Value, value: Value) -> bool {
        Typology::new().check(&schema, &value)
    }

    #[test]
    fn primitive_names() {
        assert!(check(json!("string"), json!("a")));
        assert!(check(json!("number"), json!(4.2)));
        assert!(check(json!("boolean"), json!(false)));
        assert!(check(json!("primitive"), json!(1)));
        assert!(!check(json!("primitive"), json!([])));
        assert!(!check(json!("number"), json!("42")));
        assert!(check(json!("*"), json!(null)));
    }

    #[test]
    fn optional_and_union() {
        assert!(check(json!({"n": "?number"}), json!({})));
        assert!(check(json!({"n": "?number"}), json!({"n": null})));
        assert!(!check(json!({"n": "?number"}), json!({"n": "x"})));
        assert!(check(json!("string|number"), json!(3)));
        assert!(!check(json!("string|number"), json!(true)));
    }

    #[test]
    fn objects_are_closed() {
        let schema = json!({"text": "string", "number": "?number"});
        assert!(check(schema.clone(), json!({"text": "world"})));
        assert!(!check(schema.clone(), json!({"number": 42})));
        assert!(!check(schema.clone(), json!({"text": "a", "extra": 1})));
        assert!(!check(schema, json!(null)));
    }

    #[test]
    fn arrays_check_every_element() {
        let schema = json!([{"name": "string", "age": "number"}]);
        assert!(check(schema.clone(), json!([{"name": "a", "age": 1}, {"name": "b", "age": 2}])));
        assert!(!check(schema.clone(), json!([{"name": "a", "age": "1"}])));
        assert!(check(schema.clone(), json!([])));
        assert!(!check(schema, json!({"name": "a", "age": 1})));
    }

    #[test]
    fn unknown_names_never_match() {
        assert!(!check(json!("shawarma"), json!("shawarma")));
        assert!(!check(json!(42), json!(42)));
    }

    #[test]
    fn custom_types() {
        let types = Typology::new().with_type("even", |v| v.as_i64().is_some_and(|n| n % 2 == 0));
        assert!(types.check(&json!(["even"]), &json!([2, 4])));
        assert!(!types.check(&json!(["even"]), &json!([2, 3])));
    }
}
