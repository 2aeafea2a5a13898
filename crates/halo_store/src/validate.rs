//! Settings value validation
//!
//! Checks a value against the subset of JSON schema the settings groups use
//! and reports a single message: the first schema error, or else whatever the
//! field's own validator says. Messages follow the wording settings UIs
//! commonly show (`must be string`, `must be >= 1`, ...).

use std::fmt;

use regex::Regex;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::schema::SchemaError;

/// Extra check run after the schema passes.
pub type CustomValidator = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Validator for one field schema, with its patterns compiled up front.
pub struct FieldValidator {
    schema: Value,
    patterns: FxHashMap<String, Regex>,
    custom: Option<CustomValidator>,
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidator")
            .field("schema", &self.schema)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl FieldValidator {
    /// Fails when a `pattern` in the schema is not a valid regex.
    pub fn new(schema: Value) -> Result<Self, SchemaError> {
        let mut patterns = FxHashMap::default();
        collect_patterns(&schema, &mut patterns)?;
        Ok(Self {
            schema,
            patterns,
            custom: None,
        })
    }

    pub fn with_validator(
        mut self,
        validator: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.custom = Some(Box::new(validator));
        self
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// `None` when `value` is valid, otherwise the first error message.
    pub fn check(&self, value: &Value) -> Option<String> {
        if let Some(message) = self.first_error(&self.schema, value) {
            return Some(message);
        }
        self.custom.as_ref().and_then(|custom| custom(value))
    }

    fn first_error(&self, schema: &Value, value: &Value) -> Option<String> {
        let schema = match schema {
            Value::Bool(true) => return None,
            Value::Bool(false) => return Some("boolean schema is false".to_string()),
            Value::Object(schema) => schema,
            _ => return None,
        };

        if let Some(ty) = schema.get("type") {
            if !type_matches(ty, value) {
                return Some(format!("must be {}", type_names(ty)));
            }
        }

        if let Some(expected) = schema.get("const") {
            if expected != value {
                return Some("must be equal to constant".to_string());
            }
        }

        if let Some(Value::Array(allowed)) = schema.get("enum") {
            if !allowed.contains(value) {
                return Some("must be equal to one of the allowed values".to_string());
            }
        }

        match value {
            Value::Number(n) => n.as_f64().and_then(|n| number_error(schema, n)),
            Value::String(s) => self.string_error(schema, s),
            Value::Array(items) => self.array_error(schema, items),
            Value::Object(object) => self.object_error(schema, object),
            _ => None,
        }
    }

    fn string_error(&self, schema: &Map<String, Value>, s: &str) -> Option<String> {
        let length = s.chars().count() as u64;
        if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
            if length < min {
                return Some(format!("must NOT have fewer than {min} characters"));
            }
        }
        if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
            if length > max {
                return Some(format!("must NOT have more than {max} characters"));
            }
        }
        if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
            let matches = self
                .patterns
                .get(pattern)
                .map_or(true, |regex| regex.is_match(s));
            if !matches {
                return Some(format!("must match pattern \"{pattern}\""));
            }
        }
        None
    }

    fn array_error(&self, schema: &Map<String, Value>, items: &[Value]) -> Option<String> {
        let count = items.len() as u64;
        if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
            if count < min {
                return Some(format!("must NOT have fewer than {min} items"));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
            if count > max {
                return Some(format!("must NOT have more than {max} items"));
            }
        }
        let item_schema = schema.get("items")?;
        items
            .iter()
            .find_map(|item| self.first_error(item_schema, item))
    }

    fn object_error(&self, schema: &Map<String, Value>, object: &Map<String, Value>) -> Option<String> {
        if let Some(Value::Array(required)) = schema.get("required") {
            let missing = required
                .iter()
                .filter_map(Value::as_str)
                .find(|name| !object.contains_key(*name));
            if let Some(name) = missing {
                return Some(format!("must have required property '{name}'"));
            }
        }
        let Some(Value::Object(properties)) = schema.get("properties") else {
            return None;
        };
        properties.iter().find_map(|(name, property)| {
            object
                .get(name)
                .and_then(|value| self.first_error(property, value))
        })
    }
}

/// Validate `value` against `schema`, then against `extra` if given.
///
/// An invalid `pattern` in the schema is reported as the error message.
pub fn validate(
    schema: &Value,
    value: &Value,
    extra: Option<&dyn Fn(&Value) -> Option<String>>,
) -> Option<String> {
    let validator = match FieldValidator::new(schema.clone()) {
        Ok(validator) => validator,
        Err(e) => return Some(e.to_string()),
    };
    validator
        .check(value)
        .or_else(|| extra.and_then(|extra| extra(value)))
}

fn number_error(schema: &Map<String, Value>, n: f64) -> Option<String> {
    let limit = |key: &str| schema.get(key).filter(|v| v.is_number());

    if let Some(max) = limit("maximum") {
        if max.as_f64().is_some_and(|max| n > max) {
            return Some(format!("must be <= {max}"));
        }
    }
    if let Some(min) = limit("minimum") {
        if min.as_f64().is_some_and(|min| n < min) {
            return Some(format!("must be >= {min}"));
        }
    }
    if let Some(max) = limit("exclusiveMaximum") {
        if max.as_f64().is_some_and(|max| n >= max) {
            return Some(format!("must be < {max}"));
        }
    }
    if let Some(min) = limit("exclusiveMinimum") {
        if min.as_f64().is_some_and(|min| n <= min) {
            return Some(format!("must be > {min}"));
        }
    }
    if let Some(step) = limit("multipleOf") {
        if step
            .as_f64()
            .is_some_and(|step| step > 0.0 && (n / step).fract().abs() > f64::EPSILON)
        {
            return Some(format!("must be multiple of {step}"));
        }
    }
    None
}

fn type_matches(ty: &Value, value: &Value) -> bool {
    match ty {
        Value::String(ty) => single_type_matches(ty, value),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|ty| single_type_matches(ty, value)),
        _ => true,
    }
}

fn single_type_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => match value {
            Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
            _ => false,
        },
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_names(ty: &Value) -> String {
    match ty {
        Value::String(ty) => ty.clone(),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn collect_patterns(schema: &Value, out: &mut FxHashMap<String, Regex>) -> Result<(), SchemaError> {
    match schema {
        Value::Object(map) => {
            if let Some(pattern) = map.get("pattern").and_then(Value::as_str) {
                if !out.contains_key(pattern) {
                    let regex = Regex::new(pattern).map_err(|e| SchemaError::Pattern {
                        pattern: pattern.to_string(),
                        message: e.to_string(),
                    })?;
                    out.insert(pattern.to_string(), regex);
                }
            }
            for value in map.values() {
                collect_patterns(value, out)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_patterns(item, out)?;
            }
        }
        _ => {}
    }
    Ok(())
}
