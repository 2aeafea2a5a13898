//! Settings field kinds
//!
//! Each settings field is edited with a widget chosen from its schema. The
//! choice is a lookup, in this order:
//!
//! 1. a `component` tag the registry has a renderer for (`color`, `language`)
//! 2. an `enum` list: a select
//! 3. the JSON `type`: text input for strings, numeric input for
//!    `integer`/`number`, a switch for booleans
//! 4. anything else: the fallback renderer

use rustc_hash::FxHashMap;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Enum,
    Custom(String),
}

impl FieldKind {
    /// Resolve without custom components.
    pub fn of(schema: &Value) -> Option<Self> {
        Self::resolve(schema, |_| false)
    }

    /// Resolve with `is_custom` telling which `component` tags are known.
    ///
    /// `None` means no rule matched and the caller's fallback applies.
    pub fn resolve(schema: &Value, is_custom: impl Fn(&str) -> bool) -> Option<Self> {
        let schema = schema.as_object()?;

        if let Some(tag) = schema.get("component").and_then(Value::as_str) {
            if is_custom(tag) {
                return Some(Self::Custom(tag.to_string()));
            }
        }

        if schema.get("enum").is_some_and(|e| !e.is_null()) {
            return Some(Self::Enum);
        }

        match primary_type(schema.get("type")?)? {
            "string" => Some(Self::String),
            "integer" | "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

/// The declared type; for a type list, the first one that isn't `null`.
fn primary_type(ty: &Value) -> Option<&str> {
    match ty {
        Value::String(ty) => Some(ty.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null"),
        _ => None,
    }
}

/// Renderer lookup table keyed by [`FieldKind`].
pub struct FieldRegistry<R> {
    renderers: FxHashMap<FieldKind, R>,
    fallback: R,
}

impl<R> FieldRegistry<R> {
    pub fn new(fallback: R) -> Self {
        Self {
            renderers: FxHashMap::default(),
            fallback,
        }
    }

    pub fn with(mut self, kind: FieldKind, renderer: R) -> Self {
        self.register(kind, renderer);
        self
    }

    pub fn register(&mut self, kind: FieldKind, renderer: R) {
        self.renderers.insert(kind, renderer);
    }

    /// Register a renderer for a `component` tag.
    pub fn register_custom(&mut self, tag: impl Into<String>, renderer: R) {
        self.register(FieldKind::Custom(tag.into()), renderer);
    }

    pub fn kind_of(&self, schema: &Value) -> Option<FieldKind> {
        FieldKind::resolve(schema, |tag| {
            self.renderers
                .contains_key(&FieldKind::Custom(tag.to_string()))
        })
    }

    /// Renderer for `schema`, or the fallback.
    pub fn resolve(&self, schema: &Value) -> &R {
        self.kind_of(schema)
            .and_then(|kind| self.renderers.get(&kind))
            .unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &R {
        &self.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry() -> FieldRegistry<&'static str> {
        let mut registry = FieldRegistry::new("BaseInput")
            .with(FieldKind::String, "BaseInput")
            .with(FieldKind::Number, "BaseInput")
            .with(FieldKind::Boolean, "BaseSwitch")
            .with(FieldKind::Enum, "BaseSelect");
        registry.register_custom("color", "ColorPicker");
        registry.register_custom("language", "LanguageSelector");
        registry
    }

    #[test]
    fn custom_component_wins() {
        let registry = registry();
        let schema = json!({ "type": "string", "enum": ["a"], "component": "color" });
        assert_eq!(*registry.resolve(&schema), "ColorPicker");
        assert_eq!(registry.kind_of(&schema), Some(FieldKind::Custom("color".into())));
    }

    #[test]
    fn unknown_component_falls_through() {
        let registry = registry();
        let schema = json!({ "type": "boolean", "component": "slider" });
        assert_eq!(*registry.resolve(&schema), "BaseSwitch");
    }

    #[test]
    fn enum_then_type_then_fallback() {
        let registry = registry();
        assert_eq!(*registry.resolve(&json!({ "enum": ["Auto", "Mica"] })), "BaseSelect");
        assert_eq!(*registry.resolve(&json!({ "type": "integer" })), "BaseInput");
        assert_eq!(*registry.resolve(&json!({ "type": ["null", "boolean"] })), "BaseSwitch");
        assert_eq!(*registry.resolve(&json!({ "type": "object" })), "BaseInput");
        assert_eq!(*registry.resolve(&Value::Null), "BaseInput");
    }

    #[test]
    fn kinds_without_registry() {
        assert_eq!(FieldKind::of(&json!({ "type": "number" })), Some(FieldKind::Number));
        assert_eq!(
            FieldKind::of(&json!({ "component": "color", "type": "string" })),
            Some(FieldKind::String)
        );
        assert_eq!(FieldKind::of(&json!({})), None);
    }
}
