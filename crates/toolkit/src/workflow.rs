//! Deployment strategies and the capability each one exposes.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::WorkflowError;

/// The closed set of deployment strategies a config file can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowKind {
    /// Docker on the current machine.
    Local,
    /// Image built in the cloud registry, deployed as a managed Runtime.
    Cloud,
    /// Image built locally, pushed and deployed as a managed Runtime.
    Hybrid,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 3] = [WorkflowKind::Local, WorkflowKind::Cloud, WorkflowKind::Hybrid];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowKind::Local => "local",
            WorkflowKind::Cloud => "cloud",
            WorkflowKind::Hybrid => "hybrid",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.as_str()).collect()
    }

    /// Deploy troubleshooting hints shown when deploy reports failure.
    pub fn deploy_hints(self) -> &'static [&'static str] {
        match self {
            WorkflowKind::Local => &[
                "Check if image exists",
                "Check if port is already in use",
                "Check Docker daemon logs for details",
            ],
            WorkflowKind::Cloud | WorkflowKind::Hybrid => &[
                "Check if runtime configuration is correct",
                "Check if IAM role has proper permissions",
            ],
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowKind {
    type Err = WorkflowError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| WorkflowError::UnknownWorkflow {
                name: name.to_string(),
                available: Self::names(),
            })
    }
}

/// Where a workflow operation runs and what it is configured with.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub kind: WorkflowKind,
    /// Absolute path of the config file.
    pub config_path: PathBuf,
    /// `launch_types.<kind>` from the config document.
    pub settings: Value,
}

impl WorkflowContext {
    /// Directory operations run in; the toolkit resolves relative paths and
    /// writes results back relative to it.
    pub fn working_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn config_file_name(&self) -> &OsStr {
        self.config_path.file_name().unwrap_or(self.config_path.as_os_str())
    }
}

/// Per-workflow invoke input.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeRequest {
    /// Call the managed Runtime endpoint; headers carry the API key.
    Cloud { payload: Value, headers: IndexMap<String, String> },
    /// Call the Runtime through the toolkit; the key is passed as is.
    Hybrid { payload: Value, apikey: Option<String> },
}

/// Per-workflow invoke output.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeOutcome {
    Cloud { success: bool, result: Value },
    Hybrid { success: bool },
}

impl InvokeOutcome {
    pub fn succeeded(&self) -> bool {
        match self {
            InvokeOutcome::Cloud { success, .. } | InvokeOutcome::Hybrid { success } => *success,
        }
    }

    pub fn into_result(self) -> Value {
        match self {
            InvokeOutcome::Cloud { result, .. } => result,
            InvokeOutcome::Hybrid { .. } => Value::Null,
        }
    }
}

/// Operations every deployment strategy offers.
///
/// `build` and `deploy` report failure as `Ok(false)`; `Err` is reserved for
/// the operation not running at all.
#[async_trait]
pub trait Workflow: Send + Sync {
    async fn build(&self, context: &WorkflowContext) -> anyhow::Result<bool>;

    async fn deploy(&self, context: &WorkflowContext) -> anyhow::Result<bool>;

    async fn invoke(&self, context: &WorkflowContext, request: InvokeRequest) -> anyhow::Result<InvokeOutcome>;

    /// Status object; a top-level `error` key marks a failed check.
    async fn status(&self, context: &WorkflowContext) -> anyhow::Result<Value>;

    async fn destroy(&self, context: &WorkflowContext) -> anyhow::Result<()>;
}

/// Resolves a workflow kind to its implementation.
pub trait WorkflowProvider: Send + Sync {
    fn workflow(&self, kind: WorkflowKind) -> Arc<dyn Workflow>;
}
