//! Environment variable arguments.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::ConfigError;

/// Ordered environment variable name to value mapping.
pub type EnvVars = IndexMap<String, String>;

/// Accepted input shapes, `{"KEY": "value"}` or `[{"key": "KEY", "value": "value"}]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EnvVarCollection {
    Map(IndexMap<String, Value>),
    Sequence(Vec<Value>),
}

/// Decode a JSON-string env var argument into a name to value mapping.
///
/// Numbers and booleans are stringified; nested values are rejected.
pub fn parse_env_vars(text: &str) -> Result<EnvVars, ConfigError> {
    let collection: EnvVarCollection = serde_json::from_str(text).map_err(|error| {
        if error.is_data() {
            ConfigError::Validation("envs must be either a dict or array of {key, value} objects".to_string())
        } else {
            ConfigError::Validation(format!("Invalid JSON format: {error}"))
        }
    })?;

    let mut vars = EnvVars::new();
    match collection {
        EnvVarCollection::Map(map) => {
            for (key, value) in map {
                let value = scalar_to_string(&key, &value)?;
                vars.insert(key, value);
            }
        }
        EnvVarCollection::Sequence(items) => {
            for item in items {
                let Value::Object(fields) = item else {
                    return Err(ConfigError::Validation(
                        "Array items must be objects with 'key' and 'value' fields".to_string(),
                    ));
                };
                let (Some(key), Some(value)) = (fields.get("key"), fields.get("value")) else {
                    return Err(ConfigError::Validation(
                        "Each env item must have 'key' and 'value' fields".to_string(),
                    ));
                };
                let key = match key {
                    Value::String(key) => key.clone(),
                    other => other.to_string(),
                };
                let value = scalar_to_string(&key, value)?;
                vars.insert(key, value);
            }
        }
    }
    Ok(vars)
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(ConfigError::Validation(format!(
            "Environment variable '{key}' must be a string, number or boolean"
        ))),
    }
}
