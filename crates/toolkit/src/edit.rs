//! Targeted edits to `agentkit.yaml`.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::info;

use crate::{ConfigDocument, ConfigError, EnvVars, WorkflowKind, parse_env_vars};

/// Container port every local port mapping targets.
pub const LOCAL_CONTAINER_PORT: u16 = 8000;

/// Fields a caller may change. `None`, empty strings and port 0 mean "leave as is".
#[derive(Debug, Clone, Default)]
pub struct ConfigEdit {
    pub entry_point: Option<String>,
    pub workflow_type: Option<String>,
    pub project_name: Option<String>,
    /// Deprecated; accepted and reported as ignored.
    pub image_name: Option<String>,
    pub runtime_name: Option<String>,
    pub role_name: Option<String>,
    pub entry_port: Option<u16>,
    /// JSON string, mapping or list of `{key, value}`.
    pub envs: Option<String>,
    pub ve_cr_instance_name: Option<String>,
    pub ve_cr_namespace_name: Option<String>,
    pub ve_cr_repo_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// One `dotted.path -> value` line per field written.
    pub updated: Vec<String>,
    /// Supplied fields that do not apply to the target workflow.
    pub ignored: Vec<String>,
    pub file_path: PathBuf,
    pub config: ConfigDocument,
    /// The file did not exist before this edit.
    pub created: bool,
}

impl EditOutcome {
    pub fn message(&self) -> String {
        format!("Configuration updated: {}", self.updated.join(", "))
    }
}

/// Apply `edit` to the config file at `path`.
///
/// Arguments are validated before the file is read, and the file is only
/// written when at least one field changed.
pub fn edit_config(path: &Path, edit: &ConfigEdit) -> Result<EditOutcome, ConfigError> {
    let envs = match supplied(&edit.envs) {
        Some(text) => parse_env_vars(text)?,
        None => EnvVars::new(),
    };
    let workflow_type = supplied(&edit.workflow_type)
        .map(|name| {
            name.parse::<WorkflowKind>().map_err(|_| {
                ConfigError::Validation(format!(
                    "Invalid workflow_type: {name}. Must be 'local', 'cloud', or 'hybrid'"
                ))
            })
        })
        .transpose()?;

    let file_path = std::path::absolute(path).map_err(|error| ConfigError::io(path, error))?;
    let (mut document, created) = ConfigDocument::load_or_default(&file_path)?;
    let mut updated = Vec::new();
    let mut ignored = Vec::new();

    if let Some(entry_point) = supplied(&edit.entry_point) {
        document.set_common("entry_point", entry_point.into())?;
        updated.push(format!("common.entry_point -> {entry_point}"));
    }
    if let Some(kind) = workflow_type {
        document.set_common("current_workflow", kind.as_str().into())?;
        updated.push(format!("common.current_workflow -> {kind}"));
    }
    if let Some(project_name) = supplied(&edit.project_name) {
        document.set_common("agent_name", project_name.into())?;
        updated.push(format!("common.agent_name -> {project_name}"));
    }
    let entry_port = edit.entry_port.filter(|port| *port != 0);
    if let Some(port) = entry_port {
        document.set_common("entry_port", port.into())?;
        updated.push(format!("common.entry_port -> {port}"));
    }
    if supplied(&edit.image_name).is_some() {
        ignored.push("image_name".to_string());
    }

    let cloud_fields = [
        ("runtime_name", "ve_runtime_name", &edit.runtime_name),
        ("role_name", "ve_runtime_role_name", &edit.role_name),
        ("ve_cr_instance_name", "ve_cr_instance_name", &edit.ve_cr_instance_name),
        ("ve_cr_namespace_name", "ve_cr_namespace_name", &edit.ve_cr_namespace_name),
        ("ve_cr_repo_name", "ve_cr_repo_name", &edit.ve_cr_repo_name),
    ];

    let target = workflow_type.or_else(|| document.current_workflow().parse().ok());
    match target {
        Some(WorkflowKind::Local) => {
            if let Some(port) = entry_port {
                let mapping = format!("{port}:{LOCAL_CONTAINER_PORT}");
                document.set_workflow(WorkflowKind::Local, "ports", Value::Sequence(vec![mapping.as_str().into()]))?;
                updated.push(format!("launch_types.local.ports -> [{mapping}]"));
            }
            if !envs.is_empty() {
                document.set_workflow(WorkflowKind::Local, "environment", env_mapping(&envs))?;
                updated.push(format!("launch_types.local.environment -> {} variables", envs.len()));
            }
            ignored.extend(
                cloud_fields
                    .iter()
                    .filter(|(_, _, value)| supplied(value).is_some())
                    .map(|(argument, _, _)| argument.to_string()),
            );
        }
        Some(kind) => {
            for (_, key, value) in cloud_fields {
                if let Some(value) = supplied(value) {
                    document.set_workflow(kind, key, value.into())?;
                    updated.push(format!("launch_types.{kind}.{key} -> {value}"));
                }
            }
            if !envs.is_empty() {
                document.set_workflow(kind, "ve_runtime_envs", env_mapping(&envs))?;
                updated.push(format!("launch_types.{kind}.ve_runtime_envs -> {} variables", envs.len()));
            }
        }
        None => {
            ignored.extend(
                cloud_fields
                    .iter()
                    .filter(|(_, _, value)| supplied(value).is_some())
                    .map(|(argument, _, _)| argument.to_string()),
            );
            if !envs.is_empty() {
                ignored.push("envs".to_string());
            }
        }
    }

    if updated.is_empty() {
        return Err(ConfigError::NoUpdates);
    }

    document.save(&file_path)?;
    info!(path = %file_path.display(), fields = updated.len(), created, "configuration updated");
    Ok(EditOutcome {
        updated,
        ignored,
        file_path,
        config: document,
        created,
    })
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.is_empty())
}

fn env_mapping(envs: &EnvVars) -> Value {
    let mut mapping = Mapping::new();
    for (key, value) in envs {
        mapping.insert(key.as_str().into(), value.as_str().into());
    }
    Value::Mapping(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    const EXISTING: &str = "\
common:
  agent_name: weather
  entry_point: app.py
  current_workflow: cloud
  language: python
launch_types:
  cloud:
    ve_runtime_id: r-abc123
    ve_runtime_apikey_name: X-Agent-Key
";

    fn existing_config() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agentkit.yaml");
        fs::write(&path, EXISTING).unwrap();
        (dir, path)
    }

    #[test]
    fn fresh_local_config_gets_port_mapping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agentkit.yaml");
        let edit = ConfigEdit {
            workflow_type: Some("local".to_string()),
            entry_port: Some(8100),
            ..Default::default()
        };

        let outcome = edit_config(&path, &edit).unwrap();

        assert!(outcome.created);
        let saved = ConfigDocument::load(&path).unwrap().to_json();
        assert_eq!(saved["common"]["current_workflow"], json!("local"));
        assert_eq!(saved["common"]["entry_port"], json!(8100));
        assert_eq!(saved["launch_types"]["local"]["ports"], json!(["8100:8000"]));
        assert!(outcome.updated.contains(&"launch_types.local.ports -> [8100:8000]".to_string()));
    }

    #[test]
    fn project_name_only_touches_agent_name() {
        let (_dir, path) = existing_config();
        let before = ConfigDocument::load(&path).unwrap().to_json();

        let outcome = edit_config(&path, &ConfigEdit {
            project_name: Some("forecaster".to_string()),
            ..Default::default()
        })
        .unwrap();

        let mut expected = before;
        expected["common"]["agent_name"] = json!("forecaster");
        assert_eq!(ConfigDocument::load(&path).unwrap().to_json(), expected);
        assert_eq!(outcome.updated, vec!["common.agent_name -> forecaster".to_string()]);
        assert!(outcome.ignored.is_empty());
    }

    #[test]
    fn unknown_workflow_type_is_rejected_before_writing() {
        let (_dir, path) = existing_config();

        let error = edit_config(&path, &ConfigEdit {
            workflow_type: Some("staging".to_string()),
            project_name: Some("forecaster".to_string()),
            ..Default::default()
        })
        .unwrap_err();

        assert!(error.to_string().contains("Invalid workflow_type: staging"));
        assert_eq!(fs::read_to_string(&path).unwrap(), EXISTING);
    }

    #[test]
    fn invalid_env_item_is_rejected_before_writing() {
        let (_dir, path) = existing_config();

        let error = edit_config(&path, &ConfigEdit {
            envs: Some(r#"[{"key": "A"}]"#.to_string()),
            entry_point: Some("main.py".to_string()),
            ..Default::default()
        })
        .unwrap_err();

        assert!(matches!(error, ConfigError::Validation(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), EXISTING);
    }

    #[test]
    fn nothing_supplied_leaves_file_alone() {
        let (_dir, path) = existing_config();

        let error = edit_config(&path, &ConfigEdit {
            entry_point: Some(String::new()),
            entry_port: Some(0),
            envs: Some("{}".to_string()),
            ..Default::default()
        })
        .unwrap_err();

        assert_eq!(error.to_string(), "No updates provided");
        assert_eq!(fs::read_to_string(&path).unwrap(), EXISTING);
    }

    #[test]
    fn missing_file_with_nothing_supplied_is_not_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agentkit.yaml");
        assert!(matches!(edit_config(&path, &ConfigEdit::default()), Err(ConfigError::NoUpdates)));
        assert!(!path.exists());
    }

    #[test]
    fn cloud_fields_follow_the_current_workflow() {
        let (_dir, path) = existing_config();

        let outcome = edit_config(&path, &ConfigEdit {
            runtime_name: Some("weather-runtime".to_string()),
            role_name: Some("AgentKitRole".to_string()),
            envs: Some(r#"{"MODEL": "doubao"}"#.to_string()),
            image_name: Some("legacy".to_string()),
            ..Default::default()
        })
        .unwrap();

        let cloud = ConfigDocument::load(&path).unwrap().workflow_section(WorkflowKind::Cloud);
        assert_eq!(
            cloud,
            json!({
                "ve_runtime_id": "r-abc123",
                "ve_runtime_apikey_name": "X-Agent-Key",
                "ve_runtime_name": "weather-runtime",
                "ve_runtime_role_name": "AgentKitRole",
                "ve_runtime_envs": {"MODEL": "doubao"}
            })
        );
        assert_eq!(outcome.ignored, vec!["image_name".to_string()]);
    }

    #[test]
    fn envs_replace_the_previous_set() {
        let (_dir, path) = existing_config();
        edit_config(&path, &ConfigEdit {
            envs: Some(r#"{"A": "1", "B": "2"}"#.to_string()),
            ..Default::default()
        })
        .unwrap();

        edit_config(&path, &ConfigEdit {
            envs: Some(r#"[{"key": "C", "value": 3}]"#.to_string()),
            ..Default::default()
        })
        .unwrap();

        let cloud = ConfigDocument::load(&path).unwrap().workflow_section(WorkflowKind::Cloud);
        assert_eq!(cloud["ve_runtime_envs"], json!({"C": "3"}));
    }

    #[test]
    fn switching_to_hybrid_writes_a_new_section_only() {
        let (_dir, path) = existing_config();

        edit_config(&path, &ConfigEdit {
            workflow_type: Some("hybrid".to_string()),
            ve_cr_repo_name: Some("agents".to_string()),
            ..Default::default()
        })
        .unwrap();

        let document = ConfigDocument::load(&path).unwrap();
        assert_eq!(document.current_workflow(), "hybrid");
        assert_eq!(document.workflow_section(WorkflowKind::Hybrid), json!({"ve_cr_repo_name": "agents"}));
        assert_eq!(document.workflow_section(WorkflowKind::Cloud)["ve_runtime_id"], json!("r-abc123"));
        assert_eq!(document.workflow_section(WorkflowKind::Local), json!({}));
    }

    #[test]
    fn cloud_only_fields_are_ignored_for_local() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agentkit.yaml");

        let outcome = edit_config(&path, &ConfigEdit {
            entry_point: Some("app.py".to_string()),
            runtime_name: Some("unused".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(outcome.ignored, vec!["runtime_name".to_string()]);
        assert_eq!(ConfigDocument::load(&path).unwrap().workflow_section(WorkflowKind::Local), json!({}));
    }
}
