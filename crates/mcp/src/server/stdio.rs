use anyhow::{Context, Result};
use rmcp::ServiceExt;
use tracing::info;

use crate::server::core::AgentKitMcpCore;

/// Serve `core` over stdin/stdout until the client disconnects.
pub async fn serve_stdio(core: AgentKitMcpCore) -> Result<()> {
    info!("MCP stdio server ready");
    let service = core
        .serve(rmcp::transport::io::stdio())
        .await
        .context("failed to start MCP stdio transport")?;
    service.waiting().await.context("MCP stdio transport failed")?;
    info!("MCP stdio client disconnected");
    Ok(())
}
