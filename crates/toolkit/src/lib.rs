//! Local AgentKit toolkit surface.
//!
//! Three pieces live here:
//!
//! - [`ConfigDocument`] and [`edit_config`]: the `agentkit.yaml`
//!   read-modify-write helper that only touches the fields a caller supplies
//! - [`Workflow`] / [`WorkflowProvider`]: the closed set of deployment
//!   strategies (`local`, `cloud`, `hybrid`) and the capability each one
//!   offers, with [`ToolkitCli`] delegating to the external toolkit binary
//! - [`Toolkit`]: resolves a config file to its workflow and turns every
//!   outcome, good or bad, into an [`Envelope`]

mod cli_workflow;
mod dispatcher;
mod document;
mod edit;
mod envelope;
mod envs;
mod error;
mod scaffold;
mod workflow;

pub use cli_workflow::{DEFAULT_TOOLKIT_BIN, TOOLKIT_BIN_VAR, ToolkitCli};
pub use dispatcher::Toolkit;
pub use document::{ConfigDocument, DEFAULT_CONFIG_FILE};
pub use edit::{ConfigEdit, EditOutcome, LOCAL_CONTAINER_PORT, edit_config};
pub use envelope::Envelope;
pub use envs::{EnvVars, parse_env_vars};
pub use error::{ConfigError, WorkflowError};
pub use scaffold::{DEFAULT_PROJECT_NAME, DEFAULT_TEMPLATE, init_project};
pub use workflow::{InvokeOutcome, InvokeRequest, Workflow, WorkflowContext, WorkflowKind, WorkflowProvider};
