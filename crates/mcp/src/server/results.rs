//! Tool result shaping and call logging.

use agentkit_api::ApiError;
use agentkit_toolkit::Envelope;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Envelope for a Runtime operation: the snake_case vendor result, or the
/// error with its vendor code and request id when known.
pub(crate) fn runtime_envelope(outcome: Result<Value, ApiError>) -> Envelope {
    match outcome {
        Ok(result) => Envelope::ok().with("result", result),
        Err(error) => Envelope::error(error.to_string())
            .with_opt("code", error.code())
            .with_opt("request_id", error.request_id()),
    }
}

/// Render `envelope` as tool text content, flagged as an error on failure.
pub(crate) fn tool_result(envelope: &Envelope) -> CallToolResult {
    let content = vec![Content::text(envelope.to_json_string())];
    if envelope.is_success() {
        CallToolResult::success(content)
    } else {
        CallToolResult::error(content)
    }
}

/// Log one finished tool call with secrets masked, then render it.
pub(crate) fn finish_call(tool: &str, params: &impl Serialize, envelope: Envelope) -> CallToolResult {
    let request = serde_json::to_value(params)
        .map(|value| agentkit_util::redact_json(&value))
        .unwrap_or(Value::Null);
    if envelope.is_success() {
        info!(tool, %request, "tool call succeeded");
    } else {
        let error = envelope.get("error").and_then(Value::as_str).unwrap_or_default();
        warn!(tool, %request, error = %agentkit_util::redact_sensitive(error), "tool call failed");
    }
    tool_result(&envelope)
}
