//! New agent project files from embedded templates.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::ConfigError;

pub const DEFAULT_PROJECT_NAME: &str = "my_agent";
pub const DEFAULT_TEMPLATE: &str = "basic";

const TEMPLATES: &[(&str, &str)] = &[("basic", include_str!("../templates/basic_agent.py"))];

static PROJECT_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

/// Write `<project_name>.py` into `directory` (current directory by default).
///
/// The name doubles as the Python module name, so it must be lowercase
/// letters, digits and underscores starting with a letter. Existing files
/// are never overwritten.
pub fn init_project(project_name: Option<&str>, template: Option<&str>, directory: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let project_name = project_name.filter(|name| !name.is_empty()).unwrap_or(DEFAULT_PROJECT_NAME);
    let template = template.filter(|name| !name.is_empty()).unwrap_or(DEFAULT_TEMPLATE);

    if !PROJECT_NAME.is_match(project_name) {
        return Err(ConfigError::Validation(format!(
            "Invalid project name '{project_name}': use lowercase letters, digits and underscores, starting with a letter"
        )));
    }
    let Some((_, source)) = TEMPLATES.iter().find(|(name, _)| *name == template) else {
        let available: Vec<&str> = TEMPLATES.iter().map(|(name, _)| *name).collect();
        return Err(ConfigError::Validation(format!(
            "Unknown template '{template}'. Available templates: {}",
            available.join(", ")
        )));
    };

    let directory = match directory {
        Some(directory) => directory.to_path_buf(),
        None => std::env::current_dir().map_err(|error| ConfigError::io(".", error))?,
    };
    fs::create_dir_all(&directory).map_err(|error| ConfigError::io(&directory, error))?;

    let file_name = format!("{project_name}.py");
    let path = directory.join(&file_name);
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(ConfigError::Validation(format!("File {file_name} already exists")));
        }
        Err(error) => return Err(ConfigError::io(&path, error)),
    };
    file.write_all(source.replace("{{agent_name}}", project_name).as_bytes())
        .map_err(|error| ConfigError::io(&path, error))?;

    info!(path = %path.display(), template, "created agent project");
    Ok(path)
}
