//! Recursive JSON key case normalization.

use heck::{ToSnakeCase, ToUpperCamelCase};
use serde_json::{Map, Value};

/// Target casing for [`normalize_keys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    /// `RuntimeId` -> `runtime_id`
    Snake,
    /// `runtime_id` -> `RuntimeId`
    Pascal,
}

impl KeyCase {
    fn apply(self, key: &str) -> String {
        match self {
            KeyCase::Snake => key.to_snake_case(),
            KeyCase::Pascal => key.to_upper_camel_case(),
        }
    }
}

/// Rewrite every object key in `value` (at any depth) to the requested case.
///
/// Values are left alone; only keys change. When two keys collapse into the
/// same normalized key the one that appears later in the source object wins.
pub fn normalize_keys(value: Value, case: KeyCase) -> Value {
    match value {
        Value::Object(object) => {
            let mut normalized = Map::with_capacity(object.len());
            for (key, nested) in object {
                normalized.insert(case.apply(&key), normalize_keys(nested, case));
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(|item| normalize_keys(item, case)).collect()),
        other => other,
    }
}
