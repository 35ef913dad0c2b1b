//! Secret masking for log output.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Replacement token for masked values.
pub const REDACTED: &str = "[REDACTED]";

static REDACT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(authorization:\s*)([^\r\n]+)",
        r"(?i)([A-Z0-9_]*?(?:KEY|TOKEN|SECRET|PASSWORD)=)([^\s]+)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in free-form text.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{REDACTED}")
            })
            .to_string();
    }
    redacted
}

fn is_secret_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase().replace(['_', '-'], "");
    ["apikey", "secret", "token", "password", "accesskey", "authorization"]
        .iter()
        .any(|marker| lowered.contains(marker))
        && lowered != "apikeyname"
        && lowered != "apikeylocation"
}

/// Returns a copy of `value` with every string under a secret-looking key masked.
///
/// Object keys such as `ApiKey`, `api_key`, `apikey`, `client_token` or
/// `VOLC_SECRETKEY` are treated as secrets. `ApiKeyName` and `ApiKeyLocation`
/// describe where a key goes and are kept.
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, nested)| {
                    let masked = if is_secret_key(key) && !nested.is_null() {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_json(nested)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        Value::String(text) => Value::String(redact_text(text)),
        other => other.clone(),
    }
}

/// Tool arguments often carry JSON as text; mask inside it too.
fn redact_text(text: &str) -> String {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(nested) = serde_json::from_str::<Value>(text) {
            return redact_json(&nested).to_string();
        }
    }
    redact_sensitive(text)
}
