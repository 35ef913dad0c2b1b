mod core;
mod http;
mod results;
mod schemas;
mod stdio;

pub use core::{AgentKitMcpCore, McpServices};
pub use http::{BIND_ADDRESS_VAR, DEFAULT_BIND_ADDRESS, McpHttpServer, RunningMcpHttpServer, bind_address_from_env, resolve_bind_address};
pub use stdio::serve_stdio;
