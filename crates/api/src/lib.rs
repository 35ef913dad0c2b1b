//! AgentKit Runtime API client utilities.
//!
//! This crate provides a lightweight client for the AgentKit Runtime
//! management OpenAPI. It focuses on:
//!
//! - Resolving credentials and endpoints from the unified `VOLC_*`
//!   environment variables, with the legacy `AGENTKIT_*`/`VOLCENGINE_*`
//!   names accepted as fallbacks
//! - Signing requests the way the OpenAPI gateway expects
//! - Shaping Runtime requests from tool arguments, accepting PascalCase or
//!   snake_case keys, and returning vendor results with snake_case keys
//!
//! The entry points are [`AgentKitClient`] (one per process, shared by
//! reference) and [`RuntimeService`], which exposes one method per Runtime
//! operation on top of any [`RuntimeApi`] implementation.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use agentkit_api::{AgentKitClient, CloudSettings, RuntimeService};
//!
//! async fn show(runtime_id: &str) -> Result<(), agentkit_api::ApiError> {
//!     let client = AgentKitClient::new(CloudSettings::from_env())?;
//!     let service = RuntimeService::new(Arc::new(client));
//!     let runtime = service.get_runtime(runtime_id).await?;
//!     println!("{}", runtime["status"]);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod models;
mod service;
mod settings;
mod signing;

pub use client::{AgentKitClient, DEFAULT_API_VERSION, RuntimeAction, RuntimeApi};
pub use error::ApiError;
pub use models::{
    ArtifactType, AuthorizerConfiguration, CreateRuntimeRequest, CustomJwtAuthorizer, KeyAuth, KeyValue, ListRuntimeVersionsRequest,
    ListRuntimesRequest, RuntimeIdRequest, RuntimeVersionRequest, UpdateRuntimeRequest, parse_filters,
};
pub use service::RuntimeService;
pub use settings::{CloudSettings, SETTING_ALIASES};
pub use signing::{SignedHeaders, SigningInput, sign_request};
