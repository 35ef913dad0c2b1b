//! YAML-backed `agentkit.yaml` document.
//!
//! The document is kept as a raw [`Mapping`] instead of a typed struct so a
//! read-modify-write preserves every field the toolkit itself writes back
//! (image URLs, runtime ids, build timestamps) even though this crate never
//! models them.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value};

use crate::{ConfigError, WorkflowKind};

/// Config file name used when a caller does not supply one.
pub const DEFAULT_CONFIG_FILE: &str = "agentkit.yaml";

const COMMON: &str = "common";
const LAUNCH_TYPES: &str = "launch_types";
const FALLBACK_AGENT_NAME: &str = "my_agent";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    root: Mapping,
}

impl ConfigDocument {
    /// Read and parse `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound { path: path.to_path_buf() });
            }
            Err(error) => return Err(ConfigError::io(path, error)),
        };
        Self::parse(path, &content)
    }

    /// Read `path`, or build the default document when it does not exist.
    ///
    /// The flag is `true` when the default was created.
    pub fn load_or_default(path: &Path) -> Result<(Self, bool), ConfigError> {
        match Self::load(path) {
            Ok(document) => Ok((document, false)),
            Err(ConfigError::NotFound { .. }) => Ok((Self::default_for(path), true)),
            Err(error) => Err(error),
        }
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        match value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(root) => Ok(Self { root }),
            _ => Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "top level must be a mapping".to_string(),
            }),
        }
    }

    /// Fresh document for a project whose config lives at `path`.
    pub fn default_for(path: &Path) -> Self {
        let agent_name = std::path::absolute(path)
            .ok()
            .as_deref()
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_AGENT_NAME)
            .to_string();

        let mut common = Mapping::new();
        common.insert("agent_name".into(), agent_name.into());
        common.insert("entry_point".into(), "".into());
        common.insert("current_workflow".into(), WorkflowKind::Local.as_str().into());

        let mut root = Mapping::new();
        root.insert(COMMON.into(), Value::Mapping(common));
        root.insert(LAUNCH_TYPES.into(), Value::Mapping(Mapping::new()));
        Self { root }
    }

    /// Write the document, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| ConfigError::io(parent, error))?;
        }
        let content = self.to_yaml_string()?;
        let temporary_path = temporary_path(path);
        fs::write(&temporary_path, content).map_err(|error| ConfigError::io(&temporary_path, error))?;
        fs::rename(&temporary_path, path).map_err(|error| ConfigError::io(path, error))
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(&self.root)?)
    }

    /// Whole document as JSON, for envelopes.
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(&self.root).unwrap_or(JsonValue::Null)
    }

    /// Workflow name declared under `common.current_workflow`, `local` if unset.
    pub fn current_workflow(&self) -> String {
        self.common_str("current_workflow")
            .filter(|name| !name.is_empty())
            .unwrap_or(WorkflowKind::Local.as_str())
            .to_string()
    }

    /// Entry point, if one is configured.
    pub fn entry_point(&self) -> Option<&str> {
        self.common_str("entry_point").filter(|entry| !entry.trim().is_empty())
    }

    pub fn common_str(&self, key: &str) -> Option<&str> {
        self.section(COMMON)?.get(key)?.as_str()
    }

    /// `launch_types.<kind>` as JSON; an empty object when absent.
    pub fn workflow_section(&self, kind: WorkflowKind) -> JsonValue {
        self.section(LAUNCH_TYPES)
            .and_then(|launch_types| launch_types.get(kind.as_str()))
            .and_then(|section| serde_json::to_value(section).ok())
            .filter(JsonValue::is_object)
            .unwrap_or_else(|| JsonValue::Object(Default::default()))
    }

    pub(crate) fn set_common(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        child_mapping(&mut self.root, COMMON)?.insert(key.into(), value);
        Ok(())
    }

    /// Insert into `launch_types.<kind>`, creating both levels on demand.
    pub(crate) fn set_workflow(&mut self, kind: WorkflowKind, key: &str, value: Value) -> Result<(), ConfigError> {
        let launch_types = child_mapping(&mut self.root, LAUNCH_TYPES)?;
        child_mapping(launch_types, kind.as_str())?.insert(key.into(), value);
        Ok(())
    }

    fn section(&self, key: &str) -> Option<&Mapping> {
        self.root.get(key)?.as_mapping()
    }
}

fn child_mapping<'a>(parent: &'a mut Mapping, key: &str) -> Result<&'a mut Mapping, ConfigError> {
    let entry = parent
        .entry(key.into())
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if entry.is_null() {
        *entry = Value::Mapping(Mapping::new());
    }
    entry
        .as_mapping_mut()
        .ok_or_else(|| ConfigError::Validation(format!("'{key}' must be a mapping")))
}

fn temporary_path(path: &Path) -> PathBuf {
    path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|extension| extension.to_str()).unwrap_or("yaml")
    ))
}
