//! Config file to workflow dispatch with uniform result envelopes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    ConfigDocument, ConfigEdit, ConfigError, Envelope, InvokeRequest, Workflow, WorkflowContext, WorkflowError, WorkflowKind,
    WorkflowProvider, edit_config, init_project,
};

const DEFAULT_APIKEY_HEADER: &str = "X-API-Key";
const MAX_ERROR_CHAIN_CHARS: usize = 500;

/// Runs toolkit operations for a config file and reports every outcome as an
/// [`Envelope`].
///
/// Nothing here returns `Err`: load failures, unknown workflows, failed
/// steps and raised errors all become `{"success": false, ...}`.
#[derive(Clone)]
pub struct Toolkit {
    provider: Arc<dyn WorkflowProvider>,
}

impl std::fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit").finish_non_exhaustive()
    }
}

/// A loaded config file and the workflow it selects.
struct Resolved {
    path: PathBuf,
    document: ConfigDocument,
    kind: WorkflowKind,
    workflow: Arc<dyn Workflow>,
}

impl Resolved {
    fn context(&self) -> WorkflowContext {
        WorkflowContext {
            kind: self.kind,
            config_path: self.path.clone(),
            settings: self.document.workflow_section(self.kind),
        }
    }
}

impl Toolkit {
    pub fn new(provider: Arc<dyn WorkflowProvider>) -> Self {
        Self { provider }
    }

    fn resolve(&self, config_file: &str) -> Result<Resolved, Envelope> {
        let path = absolute(config_file);
        let document = match ConfigDocument::load(&path) {
            Ok(document) => document,
            Err(ConfigError::NotFound { .. }) => {
                return Err(Envelope::error(format!("Configuration file not found: {config_file}"))
                    .with("hint", "Please check if the config_file path is correct."));
            }
            Err(error) => return Err(Envelope::error(format!("Failed to load configuration: {error}"))),
        };

        let kind = match document.current_workflow().parse::<WorkflowKind>() {
            Ok(kind) => kind,
            Err(WorkflowError::UnknownWorkflow { name, available }) => {
                return Err(Envelope::error(format!("Unknown workflow type '{name}'")).with("available_workflows", available));
            }
            Err(error) => return Err(Envelope::error(format!("Failed to load configuration: {error}"))),
        };

        Ok(Resolved {
            workflow: self.provider.workflow(kind),
            path,
            document,
            kind,
        })
    }

    pub async fn build_image(&self, config_file: &str) -> Envelope {
        let resolved = match self.resolve(config_file) {
            Ok(resolved) => resolved,
            Err(envelope) => return envelope,
        };
        if resolved.document.entry_point().is_none() {
            return Envelope::error("Entry point not configured, cannot build image");
        }

        let context = resolved.context();
        info!(workflow = %resolved.kind, config = %resolved.path.display(), "building agent image");
        match resolved.workflow.build(&context).await {
            Ok(true) => Envelope::success("Build completed successfully").with_workflow(resolved.kind),
            Ok(false) => Envelope::error("Build failed. Check if Dockerfile exists and Docker is running.")
                .with_workflow(resolved.kind)
                .with("config", &context.settings),
            Err(error) => raised("Build error", &error).with_workflow(resolved.kind),
        }
    }

    pub async fn deploy_agent(&self, config_file: &str) -> Envelope {
        let resolved = match self.resolve(config_file) {
            Ok(resolved) => resolved,
            Err(envelope) => return envelope,
        };
        if resolved.document.entry_point().is_none() {
            return Envelope::error("Entry point not configured, cannot deploy")
                .with("hint", "Use toolkit_edit_config to set entry_point");
        }

        let context = resolved.context();
        info!(workflow = %resolved.kind, config = %resolved.path.display(), "deploying agent");
        match resolved.workflow.deploy(&context).await {
            Ok(true) => Envelope::success("Deploy completed successfully").with_workflow(resolved.kind),
            Ok(false) => Envelope::error("Deploy failed. See hints for troubleshooting.")
                .with("hints", resolved.kind.deploy_hints())
                .with_workflow(resolved.kind)
                .with("config", &context.settings),
            Err(error) => raised("Deploy error", &error).with_workflow(resolved.kind),
        }
    }

    /// Build, then deploy with the configuration as the build left it.
    pub async fn launch_agent(&self, config_file: &str) -> Envelope {
        let resolved = match self.resolve(config_file) {
            Ok(resolved) => resolved,
            Err(envelope) => return envelope,
        };
        if resolved.document.entry_point().is_none() {
            return Envelope::error("Entry point not configured, cannot launch");
        }
        let kind = resolved.kind;

        info!(workflow = %kind, config = %resolved.path.display(), "launching agent");
        match resolved.workflow.build(&resolved.context()).await {
            Ok(true) => {}
            Ok(false) => {
                return Envelope::error("Build failed. Launch aborted.").with_stage("build").with_workflow(kind);
            }
            Err(error) => return raised("Build error", &error).with_stage("build").with_workflow(kind),
        }

        // The build step may have written image coordinates back to the file.
        let document = match ConfigDocument::load(&resolved.path) {
            Ok(document) => document,
            Err(error) => {
                return Envelope::error(format!("Failed to reload configuration after build: {error}"))
                    .with_stage("deploy")
                    .with_workflow(kind);
            }
        };
        let context = WorkflowContext {
            kind,
            config_path: resolved.path.clone(),
            settings: document.workflow_section(kind),
        };

        match resolved.workflow.deploy(&context).await {
            Ok(true) => Envelope::success("Launch completed successfully (build + deploy)").with_workflow(kind),
            Ok(false) => Envelope::error("Deploy failed. Build succeeded but deploy failed.")
                .with_stage("deploy")
                .with_workflow(kind),
            Err(error) => raised("Deploy error", &error).with_stage("deploy").with_workflow(kind),
        }
    }

    /// Send `payload` (a JSON string) to the deployed agent.
    pub async fn invoke_agent(&self, config_file: &str, payload: &str, apikey: Option<&str>) -> Envelope {
        let resolved = match self.resolve(config_file) {
            Ok(resolved) => resolved,
            Err(envelope) => return envelope,
        };
        let payload: Value = match serde_json::from_str(payload) {
            Ok(payload) => payload,
            Err(error) => return Envelope::error(format!("Invalid payload JSON: {error}")),
        };
        let apikey = apikey.filter(|key| !key.is_empty());

        let context = resolved.context();
        let request = match resolved.kind {
            WorkflowKind::Local => {
                return Envelope::error(format!("Invoke not supported for {} workflow", resolved.kind))
                    .with_workflow(resolved.kind);
            }
            WorkflowKind::Cloud => {
                let mut headers = IndexMap::new();
                if let Some(apikey) = apikey {
                    let header = context
                        .settings
                        .get("ve_runtime_apikey_name")
                        .and_then(Value::as_str)
                        .filter(|name| !name.is_empty())
                        .unwrap_or(DEFAULT_APIKEY_HEADER);
                    headers.insert(header.to_string(), apikey.to_string());
                }
                InvokeRequest::Cloud { payload, headers }
            }
            WorkflowKind::Hybrid => InvokeRequest::Hybrid {
                payload,
                apikey: apikey.map(str::to_string),
            },
        };

        info!(workflow = %resolved.kind, config = %resolved.path.display(), "invoking agent");
        match resolved.workflow.invoke(&context, request).await {
            Ok(outcome) if outcome.succeeded() => Envelope::success("Invoke completed successfully")
                .with("result", outcome.into_result())
                .with_workflow(resolved.kind),
            Ok(outcome) => Envelope::error("Invoke failed. Check if agent is deployed and running.")
                .with("details", outcome.into_result())
                .with_workflow(resolved.kind),
            Err(error) => Envelope::error(format!("Invoke error: {error:#}")).with_workflow(resolved.kind),
        }
    }

    pub async fn get_status(&self, config_file: &str) -> Envelope {
        let resolved = match self.resolve(config_file) {
            Ok(resolved) => resolved,
            Err(envelope) => return envelope,
        };

        match resolved.workflow.status(&resolved.context()).await {
            Ok(status) => {
                let reported = status.get("error").filter(|error| !error.is_null()).map(|error| match error {
                    Value::String(message) => message.clone(),
                    other => other.to_string(),
                });
                match reported {
                    Some(message) => Envelope::error(message).with_workflow(resolved.kind),
                    None => Envelope::ok().with_workflow(resolved.kind).with("status", status),
                }
            }
            Err(error) => Envelope::error(format!("Status check error: {error:#}")).with_workflow(resolved.kind),
        }
    }

    /// Tear down the running agent. Nothing happens unless `force` is set.
    pub async fn destroy_runtime(&self, config_file: &str, force: bool) -> Envelope {
        if !force {
            return Envelope::error("Confirmation required. Set force=True to proceed.")
                .with("warning", "This will terminate your running agent!");
        }
        let resolved = match self.resolve(config_file) {
            Ok(resolved) => resolved,
            Err(envelope) => return envelope,
        };

        warn!(workflow = %resolved.kind, config = %resolved.path.display(), "destroying agent runtime");
        match resolved.workflow.destroy(&resolved.context()).await {
            Ok(()) => Envelope::success(format!("{} runtime destroyed successfully", resolved.kind)).with_workflow(resolved.kind),
            Err(error) => Envelope::error(format!("Destroy error: {error:#}")).with_workflow(resolved.kind),
        }
    }

    pub fn edit_config(&self, config_file: &str, edit: &ConfigEdit) -> Envelope {
        match edit_config(Path::new(config_file), edit) {
            Ok(outcome) => Envelope::success(outcome.message())
                .with("file_path", outcome.file_path.display().to_string())
                .with("config", outcome.config.to_json())
                .with("updated_fields", &outcome.updated)
                .with_opt("ignored_fields", Some(&outcome.ignored).filter(|ignored| !ignored.is_empty())),
            Err(ConfigError::NoUpdates) => Envelope::error(ConfigError::NoUpdates.to_string()),
            Err(error) => Envelope::error(format!("Configuration error: {error}")),
        }
    }

    pub fn init_project(&self, project_name: Option<&str>, template: Option<&str>, directory: Option<&str>) -> Envelope {
        match init_project(project_name, template, directory.filter(|dir| !dir.is_empty()).map(Path::new)) {
            Ok(path) => {
                let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
                Envelope::success(format!("Successfully created {file_name}")).with("file_path", path.display().to_string())
            }
            Err(error) => Envelope::error(error.to_string()),
        }
    }
}

fn absolute(config_file: &str) -> PathBuf {
    std::path::absolute(config_file).unwrap_or_else(|_| PathBuf::from(config_file))
}

/// Envelope for an operation that raised instead of reporting failure.
fn raised(prefix: &str, cause: &anyhow::Error) -> Envelope {
    let detail = classify(cause);
    error!(error = %detail, "{prefix}");

    let chain: Vec<String> = cause.chain().map(ToString::to_string).collect();
    let chain = if chain.iter().map(String::len).sum::<usize>() < MAX_ERROR_CHAIN_CHARS {
        Value::from(chain)
    } else {
        Value::from("See logs for full error chain")
    };
    Envelope::error(format!("{prefix}: {detail}")).with("error_chain", chain)
}

fn classify(cause: &anyhow::Error) -> String {
    let detail = format!("{cause:#}");
    if detail.contains("address already in use") {
        format!("Port conflict detected: {detail}")
    } else if detail.to_lowercase().contains("permission denied") {
        format!("Permission error: {detail}")
    } else {
        detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn classifies_port_conflicts() {
        let cause = anyhow!("bind 0.0.0.0:8100: address already in use").context("docker run failed");
        assert_eq!(
            classify(&cause),
            "Port conflict detected: docker run failed: bind 0.0.0.0:8100: address already in use"
        );
    }

    #[test]
    fn classifies_permission_errors() {
        let cause = anyhow!("Permission denied (os error 13)");
        assert!(classify(&cause).starts_with("Permission error: "));
    }

    #[test]
    fn long_error_chains_are_summarized() {
        let envelope = raised("Deploy error", &anyhow!("x".repeat(600)));
        assert_eq!(envelope.get("error_chain"), Some(&Value::from("See logs for full error chain")));

        let envelope = raised("Deploy error", &anyhow!("short").context("outer"));
        assert_eq!(envelope.get("error_chain"), Some(&Value::from(vec!["outer", "short"])));
    }
}
