//! JSON result envelopes returned by every tool.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::WorkflowKind;

/// `{"success": bool, ...}` object with either a payload or an `error` string.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    fields: Map<String, Value>,
}

impl Envelope {
    /// Success with no message; add payload fields with [`Envelope::with`].
    pub fn ok() -> Self {
        let mut fields = Map::new();
        fields.insert("success".to_string(), Value::Bool(true));
        Self { fields }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::ok().with("message", message.into())
    }

    pub fn error(error: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("success".to_string(), Value::Bool(false));
        fields.insert("error".to_string(), Value::String(error.into()));
        Self { fields }
    }

    /// Add or replace a field. Values that fail to serialize become `null`.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
        self
    }

    /// Add a field only when `value` is present.
    pub fn with_opt<T: Serialize>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn with_workflow(self, kind: WorkflowKind) -> Self {
        self.with("workflow", kind.as_str())
    }

    pub fn with_stage(self, stage: &str) -> Self {
        self.with("stage", stage)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.fields.get("success"), Some(Value::Bool(true)))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_else(|_| r#"{"success":false,"error":"unserializable result"}"#.to_string())
    }
}

impl From<Envelope> for Value {
    fn from(envelope: Envelope) -> Self {
        envelope.into_value()
    }
}
