//! Decoding of JSON-string tool arguments.

use serde_json::Value;
use thiserror::Error;

/// A tool argument that should have held JSON text but did not.
#[derive(Debug, Error)]
#[error("Invalid JSON in '{argument}': {source}")]
pub struct ArgumentError {
    pub argument: String,
    #[source]
    pub source: serde_json::Error,
}

/// Decode the JSON text carried by the tool argument `argument`.
pub fn parse_json_argument(argument: &str, text: &str) -> Result<Value, ArgumentError> {
    serde_json::from_str(text).map_err(|source| ArgumentError {
        argument: argument.to_string(),
        source,
    })
}

/// Like [`parse_json_argument`], treating an absent or blank argument as `None`.
pub fn parse_optional_json_argument(argument: &str, text: Option<&str>) -> Result<Option<Value>, ArgumentError> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_json_argument(argument, text).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_names_the_offending_argument() {
        let error = parse_json_argument("authorizer_configuration", "{\"KeyAuth\":").unwrap_err();
        assert_eq!(error.argument, "authorizer_configuration");
        assert!(error.to_string().starts_with("Invalid JSON in 'authorizer_configuration':"), "{error}");
    }

    #[test]
    fn blank_optional_argument_is_absent() {
        assert!(parse_optional_json_argument("envs", None).unwrap().is_none());
        assert!(parse_optional_json_argument("envs", Some("   ")).unwrap().is_none());
        let parsed = parse_optional_json_argument("envs", Some("[]")).unwrap();
        assert_eq!(parsed, Some(Value::Array(Vec::new())));
    }
}
