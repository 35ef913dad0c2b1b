use std::sync::Arc;

use agentkit_api::{AgentKitClient, CloudSettings};
use agentkit_mcp::{AgentKitMcpCore, McpHttpServer, McpServices, bind_address_from_env, serve_stdio};
use agentkit_toolkit::ToolkitCli;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "agentkit-mcp-server")]
#[command(about = "MCP server for AgentKit Runtime management and the local toolkit", long_about = None)]
struct Cli {
    /// Transport to serve MCP over
    #[arg(short, long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Transport {
    #[default]
    Stdio,
    StreamableHttp,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Must run before anything reads the environment.
    let dotenv = dotenvy::dotenv_override();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(error) if error.not_found() => {}
        Err(error) => warn!(%error, "failed to load .env"),
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(run(cli.transport))
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

async fn run(transport: Transport) -> Result<()> {
    let settings = CloudSettings::from_env();
    if settings.credentials().is_err() {
        warn!("no cloud credentials configured; runtime tools will fail until VOLC_ACCESSKEY and VOLC_SECRETKEY are set");
    }
    let toolkit = ToolkitCli::from_env(&settings);
    let client = AgentKitClient::new(settings).context("failed to create AgentKit client")?;
    let services = Arc::new(McpServices::new(Arc::new(client), Arc::new(toolkit)));

    match transport {
        Transport::Stdio => serve_stdio(AgentKitMcpCore::new(services)).await,
        Transport::StreamableHttp => {
            let bind_address = bind_address_from_env()?;
            let running = McpHttpServer::new(bind_address, services).start().await?;
            tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
            info!("shutting down");
            running.stop().await
        }
    }
}
