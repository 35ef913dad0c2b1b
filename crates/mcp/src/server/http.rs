//! Streamable HTTP hosting for the MCP server.

use std::net::{IpAddr, SocketAddr};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use anyhow::{Result, anyhow};
use axum::Router;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::server::core::{AgentKitMcpCore, McpServices};

/// Address used when `AGENTKIT_MCP_BIND_ADDRESS` is unset.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
/// Environment variable overriding the HTTP bind address.
pub const BIND_ADDRESS_VAR: &str = "AGENTKIT_MCP_BIND_ADDRESS";

/// Host configuration for an MCP streamable HTTP server instance.
#[derive(Debug, Clone)]
pub struct McpHttpServer {
    bind_address: SocketAddr,
    services: Arc<McpServices>,
}

impl McpHttpServer {
    pub fn new(bind_address: SocketAddr, services: Arc<McpServices>) -> Self {
        Self { bind_address, services }
    }

    /// Start the server and return a handle for runtime inspection and shutdown.
    pub async fn start(self) -> Result<RunningMcpHttpServer> {
        let cancellation_token = CancellationToken::new();
        let session_manager = Arc::new(LocalSessionManager::default());
        let client_counter = Arc::new(AtomicUsize::new(0));
        let monitor_handle = spawn_session_monitor(
            Arc::clone(&session_manager),
            Arc::clone(&client_counter),
            cancellation_token.child_token(),
        );

        let services = Arc::clone(&self.services);
        let service: StreamableHttpService<AgentKitMcpCore, LocalSessionManager> = StreamableHttpService::new(
            move || Ok(AgentKitMcpCore::new(Arc::clone(&services))),
            Arc::clone(&session_manager),
            StreamableHttpServerConfig {
                stateful_mode: true,
                sse_keep_alive: None,
                cancellation_token: cancellation_token.child_token(),
                ..Default::default()
            },
        );

        let router = Router::new().nest_service("/mcp", service);
        let listener = tokio::net::TcpListener::bind(self.bind_address)
            .await
            .map_err(|error| anyhow!("failed to bind MCP HTTP server to {}: {error}", self.bind_address))?;
        let bound_address = listener.local_addr()?;
        info!(address = %bound_address, "MCP HTTP server listening on /mcp");

        let server_handle = tokio::spawn({
            let shutdown = cancellation_token.child_token();
            async move {
                if let Err(error) = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await
                {
                    warn!(%error, "MCP HTTP server stopped with an error");
                }
            }
        });

        Ok(RunningMcpHttpServer {
            bind_address: bound_address,
            cancellation_token,
            server_handle,
            monitor_handle,
            client_counter,
        })
    }
}

/// Runtime handle for a running MCP HTTP server.
#[derive(Debug)]
pub struct RunningMcpHttpServer {
    bind_address: SocketAddr,
    cancellation_token: CancellationToken,
    server_handle: JoinHandle<()>,
    monitor_handle: JoinHandle<()>,
    client_counter: Arc<AtomicUsize>,
}

impl RunningMcpHttpServer {
    pub fn bound_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Most recently observed number of open MCP sessions.
    pub fn connected_clients(&self) -> usize {
        self.client_counter.load(Ordering::Relaxed)
    }

    /// Stop the server and wait for background tasks to finish.
    pub async fn stop(self) -> Result<()> {
        self.cancellation_token.cancel();
        self.monitor_handle
            .await
            .map_err(|error| anyhow!("MCP HTTP monitor task failed: {error}"))?;
        self.server_handle
            .await
            .map_err(|error| anyhow!("MCP HTTP server task failed: {error}"))?;
        info!(address = %self.bind_address, "MCP HTTP server stopped");
        Ok(())
    }
}

/// Parse the HTTP bind address, falling back to [`DEFAULT_BIND_ADDRESS`].
///
/// Non-loopback addresses are accepted but logged, since the server has no
/// authentication of its own.
pub fn resolve_bind_address(bind_address: Option<&str>) -> Result<SocketAddr> {
    let address = match bind_address.map(str::trim) {
        None | Some("") => DEFAULT_BIND_ADDRESS,
        Some(address) => address,
    };
    let parsed: SocketAddr = address
        .parse()
        .map_err(|error| anyhow!("invalid MCP HTTP bind address '{address}': {error}"))?;
    if !is_loopback(parsed.ip()) {
        warn!(address = %parsed, "MCP HTTP server is reachable beyond this host");
    }
    Ok(parsed)
}

/// [`resolve_bind_address`] applied to `AGENTKIT_MCP_BIND_ADDRESS`.
pub fn bind_address_from_env() -> Result<SocketAddr> {
    resolve_bind_address(std::env::var(BIND_ADDRESS_VAR).ok().as_deref())
}

fn is_loopback(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(ip) => ip.is_loopback(),
        IpAddr::V6(ip) => ip.is_loopback(),
    }
}

fn spawn_session_monitor(
    session_manager: Arc<LocalSessionManager>,
    client_counter: Arc<AtomicUsize>,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(500));
        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = ticker.tick() => {
                    let count = session_manager.sessions.read().await.len();
                    client_counter.store(count, Ordering::Relaxed);
                }
            }
        }
    })
}
