//! Model Context Protocol server for AgentKit.
//!
//! [`AgentKitMcpCore`] registers one tool per Runtime OpenAPI operation and
//! one per local toolkit operation. Every tool answers with a JSON envelope
//! (`{"success": true, ...}` or `{"success": false, "error": ...}`) as text
//! content; failures are data, never protocol errors.
//!
//! Hosting is either [`serve_stdio`] or [`McpHttpServer`] (streamable HTTP
//! under `/mcp`).

mod server;

pub use server::{
    AgentKitMcpCore, BIND_ADDRESS_VAR, DEFAULT_BIND_ADDRESS, McpHttpServer, McpServices, RunningMcpHttpServer, bind_address_from_env,
    resolve_bind_address, serve_stdio,
};
