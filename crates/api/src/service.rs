//! Typed Runtime operations over a [`RuntimeApi`].

use std::sync::Arc;

use agentkit_util::{KeyCase, normalize_keys};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    ApiError, CreateRuntimeRequest, ListRuntimeVersionsRequest, ListRuntimesRequest, RuntimeAction, RuntimeApi, RuntimeIdRequest,
    RuntimeVersionRequest, UpdateRuntimeRequest,
};

/// One method per Runtime operation.
///
/// Each call serializes its request as PascalCase, invokes exactly one
/// action, and returns the vendor result with snake_case keys. Nothing is
/// validated here beyond what the request types already enforce; the service
/// is the authority on required fields.
#[derive(Clone)]
pub struct RuntimeService {
    api: Arc<dyn RuntimeApi>,
}

impl std::fmt::Debug for RuntimeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeService").finish_non_exhaustive()
    }
}

impl RuntimeService {
    pub fn new(api: Arc<dyn RuntimeApi>) -> Self {
        Self { api }
    }

    pub async fn create_runtime(&self, request: &CreateRuntimeRequest) -> Result<Value, ApiError> {
        self.dispatch(RuntimeAction::Create, request).await
    }

    pub async fn delete_runtime(&self, runtime_id: &str) -> Result<Value, ApiError> {
        self.dispatch(RuntimeAction::Delete, &RuntimeIdRequest {
            runtime_id: runtime_id.to_string(),
        })
        .await
    }

    pub async fn get_runtime(&self, runtime_id: &str) -> Result<Value, ApiError> {
        self.dispatch(RuntimeAction::Get, &RuntimeIdRequest {
            runtime_id: runtime_id.to_string(),
        })
        .await
    }

    pub async fn update_runtime(&self, request: &UpdateRuntimeRequest) -> Result<Value, ApiError> {
        self.dispatch(RuntimeAction::Update, request).await
    }

    pub async fn list_runtimes(&self, request: &ListRuntimesRequest) -> Result<Value, ApiError> {
        self.dispatch(RuntimeAction::List, request).await
    }

    /// Release the latest draft, or roll back to `version_number` when given.
    pub async fn release_runtime(&self, runtime_id: &str, version_number: Option<u32>) -> Result<Value, ApiError> {
        self.dispatch(RuntimeAction::Release, &RuntimeVersionRequest {
            runtime_id: runtime_id.to_string(),
            version_number,
        })
        .await
    }

    /// Inspect one version; `None` means the current one.
    pub async fn get_runtime_version(&self, runtime_id: &str, version_number: Option<u32>) -> Result<Value, ApiError> {
        self.dispatch(RuntimeAction::GetVersion, &RuntimeVersionRequest {
            runtime_id: runtime_id.to_string(),
            version_number,
        })
        .await
    }

    pub async fn list_runtime_versions(&self, request: &ListRuntimeVersionsRequest) -> Result<Value, ApiError> {
        self.dispatch(RuntimeAction::ListVersions, request).await
    }

    async fn dispatch<T: Serialize>(&self, action: RuntimeAction, request: &T) -> Result<Value, ApiError> {
        let body = serde_json::to_value(request)?;
        debug!(%action, request = %agentkit_util::redact_json(&body), "dispatching runtime action");
        let result = self.api.call(action, body).await?;
        Ok(normalize_keys(result, KeyCase::Snake))
    }
}
