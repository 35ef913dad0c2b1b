//! HTTP client for the Runtime OpenAPI.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, header};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::signing::CONTENT_TYPE_JSON;
use crate::{ApiError, CloudSettings, SigningInput, sign_request};

/// API version sent with every action.
pub const DEFAULT_API_VERSION: &str = "2025-10-30";

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Runtime management actions exposed by the OpenAPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeAction {
    Create,
    Delete,
    Get,
    Update,
    List,
    Release,
    GetVersion,
    ListVersions,
}

impl RuntimeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeAction::Create => "CreateAgentKitRuntime",
            RuntimeAction::Delete => "DeleteAgentKitRuntime",
            RuntimeAction::Get => "GetAgentKitRuntime",
            RuntimeAction::Update => "UpdateAgentKitRuntime",
            RuntimeAction::List => "ListAgentKitRuntimes",
            RuntimeAction::Release => "ReleaseAgentKitRuntime",
            RuntimeAction::GetVersion => "GetAgentKitRuntimeVersion",
            RuntimeAction::ListVersions => "ListAgentKitRuntimeVersions",
        }
    }
}

impl std::fmt::Display for RuntimeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport seam for Runtime actions.
///
/// `body` is the PascalCase request object; the returned value is the
/// vendor's `Result` object, untouched.
#[async_trait]
pub trait RuntimeApi: Send + Sync {
    async fn call(&self, action: RuntimeAction, body: Value) -> Result<Value, ApiError>;
}

/// Signed HTTP client for the OpenAPI gateway.
///
/// Built once at process start. Missing credentials do not prevent
/// construction; they surface as [`ApiError::MissingCredentials`] on the
/// first call so toolkit-only deployments still start.
#[derive(Debug, Clone)]
pub struct AgentKitClient {
    settings: CloudSettings,
    endpoint: Url,
    api_version: String,
    http: Client,
    user_agent: String,
}

impl AgentKitClient {
    pub fn new(settings: CloudSettings) -> Result<Self, ApiError> {
        let endpoint = settings.endpoint()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|source| ApiError::Network {
                action: "client setup".to_string(),
                source,
            })?;
        Ok(Self {
            settings,
            endpoint,
            api_version: DEFAULT_API_VERSION.to_string(),
            http,
            user_agent: format!("agentkit-mcp/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS),
        })
    }

    /// Override the API version sent with each action.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn settings(&self) -> &CloudSettings {
        &self.settings
    }

    /// `host[:port]` exactly as reqwest will send it in the Host header.
    fn host_header(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

#[async_trait]
impl RuntimeApi for AgentKitClient {
    async fn call(&self, action: RuntimeAction, body: Value) -> Result<Value, ApiError> {
        let (access_key, secret_key) = self.settings.credentials()?;
        let payload = serde_json::to_vec(&body)?;
        let query = [("Action", action.as_str()), ("Version", self.api_version.as_str())];
        let host = self.host_header();

        let signed = sign_request(
            &SigningInput {
                method: "POST",
                host: &host,
                path: self.endpoint.path(),
                query: &query,
                body: &payload,
                access_key,
                secret_key,
                region: &self.settings.region,
                service: &self.settings.service,
            },
            Utc::now(),
        );

        debug!(%action, endpoint = %self.endpoint, "calling runtime api");
        let response = self
            .http
            .post(self.endpoint.clone())
            .query(&query)
            .header(header::CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(header::USER_AGENT, &self.user_agent)
            .header("X-Date", &signed.x_date)
            .header("X-Content-Sha256", &signed.content_sha256)
            .header(header::AUTHORIZATION, &signed.authorization)
            .body(payload)
            .send()
            .await
            .map_err(|source| ApiError::Network {
                action: action.to_string(),
                source,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| ApiError::Network {
            action: action.to_string(),
            source,
        })?;
        unwrap_envelope(action, status.as_u16(), &text)
    }
}

/// Extract `Result` from the gateway envelope, mapping reported errors.
fn unwrap_envelope(action: RuntimeAction, status: u16, text: &str) -> Result<Value, ApiError> {
    let http_error = || ApiError::Http {
        action: action.to_string(),
        status,
        body: truncate(text, MAX_ERROR_BODY_CHARS),
    };
    let Ok(envelope) = serde_json::from_str::<Value>(text) else {
        return Err(http_error());
    };

    let metadata = envelope.get("ResponseMetadata");
    if let Some(error) = metadata.and_then(|metadata| metadata.get("Error")).filter(|error| !error.is_null()) {
        let field = |name: &str| error.get(name).and_then(Value::as_str).unwrap_or_default().to_string();
        return Err(ApiError::Service {
            action: action.to_string(),
            code: field("Code"),
            message: field("Message"),
            request_id: metadata
                .and_then(|metadata| metadata.get("RequestId"))
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }
    if !(200..300).contains(&status) {
        return Err(http_error());
    }

    Ok(envelope
        .get("Result")
        .cloned()
        .filter(|result| !result.is_null())
        .unwrap_or_else(|| Value::Object(Map::new())))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
