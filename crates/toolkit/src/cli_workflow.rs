//! Workflows backed by the external AgentKit toolkit executable.
//!
//! Every operation is one child process:
//!
//! ```text
//! <toolkit> <build|deploy|invoke|status|destroy> --config-file <name> [options]
//! ```
//!
//! run in the config file's directory with the resolved cloud settings
//! exported under their primary names. The exit status is the success
//! signal; stdout is read as JSON when it parses.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use agentkit_api::CloudSettings;
use anyhow::{Context, bail};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{InvokeOutcome, InvokeRequest, Workflow, WorkflowContext, WorkflowKind, WorkflowProvider};

/// Environment variable naming the toolkit command line.
pub const TOOLKIT_BIN_VAR: &str = "AGENTKIT_TOOLKIT_BIN";
pub const DEFAULT_TOOLKIT_BIN: &str = "agentkit";

/// [`WorkflowProvider`] that shells out to the toolkit executable.
#[derive(Debug, Clone)]
pub struct ToolkitCli {
    runner: Arc<CommandRunner>,
}

#[derive(Debug)]
struct CommandRunner {
    program: PathBuf,
    leading_args: Vec<String>,
    env: Vec<(&'static str, String)>,
}

impl ToolkitCli {
    /// `command_line` is the program followed by any fixed leading arguments,
    /// e.g. `agentkit` or `uvx agentkit`. Blank falls back to `agentkit`.
    pub fn new(command_line: &str, settings: &CloudSettings) -> Self {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| DEFAULT_TOOLKIT_BIN.to_string());
        Self {
            runner: Arc::new(CommandRunner {
                program: PathBuf::from(program),
                leading_args: parts.collect(),
                env: settings.exported_env(),
            }),
        }
    }

    /// Command line from `AGENTKIT_TOOLKIT_BIN`, default `agentkit`.
    pub fn from_env(settings: &CloudSettings) -> Self {
        let command_line = std::env::var(TOOLKIT_BIN_VAR).unwrap_or_default();
        Self::new(&command_line, settings)
    }

    pub fn program(&self) -> &std::path::Path {
        &self.runner.program
    }
}

impl WorkflowProvider for ToolkitCli {
    fn workflow(&self, kind: WorkflowKind) -> Arc<dyn Workflow> {
        Arc::new(CliWorkflow {
            kind,
            runner: self.runner.clone(),
        })
    }
}

struct CliWorkflow {
    kind: WorkflowKind,
    runner: Arc<CommandRunner>,
}

struct CommandOutput {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl CommandOutput {
    fn stdout_value(&self) -> Value {
        let trimmed = self.stdout.trim();
        serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
    }

    fn failure_detail(&self) -> String {
        [self.stderr.trim(), self.stdout.trim()]
            .into_iter()
            .find(|text| !text.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| match self.code {
                Some(code) => format!("exited with code {code}"),
                None => "terminated by signal".to_string(),
            })
    }
}

impl CommandRunner {
    async fn run(&self, context: &WorkflowContext, subcommand: &str, options: &[String]) -> anyhow::Result<CommandOutput> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .arg(subcommand)
            .arg("--config-file")
            .arg(context.config_file_name())
            .args(options)
            .current_dir(context.working_dir())
            .envs(self.env.iter().map(|(name, value)| (*name, value.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(
            program = %self.program.display(),
            subcommand,
            workflow = %context.kind,
            dir = %context.working_dir().display(),
            "running toolkit command"
        );
        let output = command.output().await.with_context(|| {
            format!(
                "failed to run `{}`; set {TOOLKIT_BIN_VAR} to the toolkit executable",
                self.program.display()
            )
        })?;

        let result = CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.success {
            warn!(subcommand, workflow = %context.kind, code = ?result.code, "toolkit command failed");
        }
        for line in result.stderr.lines().filter(|line| !line.trim().is_empty()) {
            debug!(subcommand, "toolkit: {line}");
        }
        Ok(result)
    }
}

#[async_trait]
impl Workflow for CliWorkflow {
    async fn build(&self, context: &WorkflowContext) -> anyhow::Result<bool> {
        Ok(self.runner.run(context, "build", &[]).await?.success)
    }

    async fn deploy(&self, context: &WorkflowContext) -> anyhow::Result<bool> {
        Ok(self.runner.run(context, "deploy", &[]).await?.success)
    }

    async fn invoke(&self, context: &WorkflowContext, request: InvokeRequest) -> anyhow::Result<InvokeOutcome> {
        match (self.kind, request) {
            (WorkflowKind::Cloud, InvokeRequest::Cloud { payload, headers }) => {
                let mut options = vec!["--payload".to_string(), payload.to_string()];
                if !headers.is_empty() {
                    options.push("--headers".to_string());
                    options.push(serde_json::to_string(&headers)?);
                }
                let output = self.runner.run(context, "invoke", &options).await?;
                let result = if output.success {
                    output.stdout_value()
                } else {
                    Value::String(output.failure_detail())
                };
                Ok(InvokeOutcome::Cloud {
                    success: output.success,
                    result,
                })
            }
            (WorkflowKind::Hybrid, InvokeRequest::Hybrid { payload, apikey }) => {
                let mut options = vec!["--payload".to_string(), payload.to_string()];
                if let Some(apikey) = apikey {
                    options.push("--apikey".to_string());
                    options.push(apikey);
                }
                let output = self.runner.run(context, "invoke", &options).await?;
                Ok(InvokeOutcome::Hybrid { success: output.success })
            }
            (kind, _) => bail!("invoke request does not match the {kind} workflow"),
        }
    }

    async fn status(&self, context: &WorkflowContext) -> anyhow::Result<Value> {
        let output = self.runner.run(context, "status", &[]).await?;
        if !output.success {
            return Ok(json!({ "error": output.failure_detail() }));
        }
        Ok(match output.stdout_value() {
            Value::Object(status) => Value::Object(status),
            other => json!({ "output": other }),
        })
    }

    async fn destroy(&self, context: &WorkflowContext) -> anyhow::Result<()> {
        let output = self.runner.run(context, "destroy", &["--force".to_string()]).await?;
        if !output.success {
            bail!("{} destroy failed: {}", self.kind, output.failure_detail());
        }
        Ok(())
    }
}
