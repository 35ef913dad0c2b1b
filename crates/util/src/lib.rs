//! Shared helpers for the AgentKit MCP server.
//!
//! The vendor API speaks PascalCase JSON while tool callers get snake_case
//! back, tool arguments arrive as JSON strings, and tool calls are logged with
//! secrets masked. Those three concerns live here so the API, toolkit and MCP
//! crates share one implementation of each.

mod case;
mod json_args;
mod redact;

pub use case::{KeyCase, normalize_keys};
pub use json_args::{ArgumentError, parse_json_argument, parse_optional_json_argument};
pub use redact::{REDACTED, redact_json, redact_sensitive};
