//! Settings group schemas
//!
//! The host describes each settings group with a JSON schema. Local `$ref`s
//! are inlined once at load time so the rest of the shell can walk plain
//! trees. A group that can't be dereferenced is logged and skipped.

use std::collections::{BTreeMap, HashMap};

use halo_core::Backend;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::StoreError;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unresolved reference `{0}`")]
    Unresolved(String),

    #[error("unsupported reference `{0}` (only local `#/...` references are resolved)")]
    Unsupported(String),

    #[error("circular reference `{0}`")]
    Cycle(String),

    #[error("invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
}

/// Dereferenced schemas of every settings group.
#[derive(Clone, Debug, Default)]
pub struct SettingsSchemas {
    groups: BTreeMap<String, Value>,
}

impl SettingsSchemas {
    pub async fn fetch(backend: &dyn Backend) -> Result<Self, StoreError> {
        let raw = backend.get_settings_schemas().await?;
        Ok(Self::from_groups(raw))
    }

    pub fn from_groups(raw: HashMap<String, Value>) -> Self {
        let mut groups = BTreeMap::new();
        for (key, schema) in raw {
            if schema.is_null() {
                continue;
            }
            match dereference(&schema) {
                Ok(resolved) => {
                    groups.insert(key, resolved);
                }
                Err(e) => warn!("Fail to parse settings group [{key}]: {e}"),
            }
        }
        debug!(groups = groups.len(), "SettingsSchemas: loaded");
        Self { groups }
    }

    pub fn group(&self, name: &str) -> Option<&Value> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.groups.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    /// Schema of one field of a group.
    pub fn property(&self, group: &str, field: &str) -> Option<&Value> {
        self.group(group)?.get("properties")?.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Inline every local `$ref` of `schema`.
///
/// Keywords next to a `$ref` are kept and win over the referenced schema's
/// own keywords.
pub fn dereference(schema: &Value) -> Result<Value, SchemaError> {
    let mut stack = Vec::new();
    resolve(schema, schema, &mut stack)
}

fn resolve(node: &Value, root: &Value, stack: &mut Vec<String>) -> Result<Value, SchemaError> {
    match node {
        Value::Object(map) => {
            let Some(reference) = map.get("$ref") else {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(key.clone(), resolve(value, root, stack)?);
                }
                return Ok(Value::Object(out));
            };

            let reference = reference
                .as_str()
                .ok_or_else(|| SchemaError::Unsupported(reference.to_string()))?;
            let target = lookup(root, reference)?;

            if stack.iter().any(|seen| seen == reference) {
                return Err(SchemaError::Cycle(reference.to_string()));
            }
            stack.push(reference.to_string());
            let resolved = resolve(target, root, stack);
            stack.pop();
            let resolved = resolved?;

            let siblings = map.iter().filter(|(key, _)| key.as_str() != "$ref");
            match resolved {
                Value::Object(mut merged) => {
                    for (key, value) in siblings {
                        merged.insert(key.clone(), resolve(value, root, stack)?);
                    }
                    Ok(Value::Object(merged))
                }
                other if map.len() == 1 => Ok(other),
                // `true`/`false` schemas can't take extra keywords.
                _ => Err(SchemaError::Unsupported(reference.to_string())),
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve(item, root, stack))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn lookup<'a>(root: &'a Value, reference: &str) -> Result<&'a Value, SchemaError> {
    let pointer = reference
        .strip_prefix('#')
        .ok_or_else(|| SchemaError::Unsupported(reference.to_string()))?;
    if pointer.is_empty() {
        return Ok(root);
    }
    root.pointer(pointer)
        .ok_or_else(|| SchemaError::Unresolved(reference.to_string()))
}
