use agentkit_api::{
    ApiError, ArtifactType, AuthorizerConfiguration, CreateRuntimeRequest, KeyValue, ListRuntimeVersionsRequest, ListRuntimesRequest,
    UpdateRuntimeRequest, parse_filters,
};
use agentkit_toolkit::{ConfigEdit, DEFAULT_CONFIG_FILE, DEFAULT_TEMPLATE};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_RESULTS: u32 = 20;

fn default_config_file() -> String {
    DEFAULT_CONFIG_FILE.to_string()
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn default_platform() -> String {
    "auto".to_string()
}

fn default_true() -> bool {
    true
}

/// Parameters for `create_runtime`.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateRuntimeParams {
    /// Runtime name; 1-128 characters, must not start with a digit, hyphen or underscore.
    pub name: String,
    #[schemars(description = "Artifact type: 'image' (container image) or 'tos' (object storage code package).")]
    pub artifact_type: String,
    #[schemars(description = "Artifact address, e.g. the full registry image URL with tag from toolkit_build_image.")]
    pub artifact_url: String,
    #[schemars(description = "IAM role the Runtime assumes to reach other cloud services.")]
    pub role_name: String,
    #[schemars(
        description = "JSON string. KeyAuth: {\"KeyAuth\":{\"ApiKeyName\":\"x-api-key\",\"ApiKey\":\"secret\",\"ApiKeyLocation\":\"HEADER\"}} or JWT: {\"CustomJwtAuthorizer\":{\"AllowedClients\":[\"client1\"],\"DiscoveryUrl\":\"https://...\"}}. snake_case keys are accepted too."
    )]
    pub authorizer_configuration: String,
    pub description: Option<String>,
    #[schemars(description = "JSON list of environment variables: [{\"Key\":\"NAME\",\"Value\":\"value\"}].")]
    pub envs: Option<String>,
    #[schemars(description = "JSON list of resource tags: [{\"Key\":\"key\",\"Value\":\"value\"}].")]
    pub tags: Option<String>,
    #[schemars(description = "Enable APM+ monitoring.")]
    pub apmplus_enable: Option<bool>,
    #[schemars(description = "Container start command overriding the image CMD/ENTRYPOINT.")]
    pub command: Option<String>,
    pub project_name: Option<String>,
    #[schemars(description = "Idempotency token, at most 64 ASCII characters.")]
    pub client_token: Option<String>,
}

impl CreateRuntimeParams {
    pub fn to_request(&self) -> Result<CreateRuntimeRequest, ApiError> {
        Ok(CreateRuntimeRequest {
            name: self.name.clone(),
            artifact_type: self.artifact_type.parse::<ArtifactType>()?,
            artifact_url: self.artifact_url.clone(),
            role_name: self.role_name.clone(),
            authorizer_configuration: AuthorizerConfiguration::from_json_argument(&self.authorizer_configuration)?,
            description: self.description.clone(),
            envs: KeyValue::list_from_json_argument("envs", self.envs.as_deref())?,
            tags: KeyValue::list_from_json_argument("tags", self.tags.as_deref())?,
            apmplus_enable: self.apmplus_enable,
            command: self.command.clone(),
            project_name: self.project_name.clone(),
            client_token: self.client_token.clone(),
        })
    }
}

/// Parameters addressing one Runtime.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RuntimeIdParams {
    #[schemars(description = "Runtime id, e.g. 'r-abc123'.")]
    pub runtime_id: String,
}

/// Parameters for `update_runtime`. Only supplied fields change.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpdateRuntimeParams {
    pub runtime_id: String,
    pub description: Option<String>,
    pub artifact_url: Option<String>,
    pub role_name: Option<String>,
    #[schemars(description = "JSON string, same shape as for create_runtime.")]
    pub authorizer_configuration: Option<String>,
    #[schemars(description = "JSON list of environment variables; replaces the current set.")]
    pub envs: Option<String>,
    #[schemars(description = "JSON list of resource tags.")]
    pub tags: Option<String>,
    #[schemars(description = "Release the new version immediately after updating.")]
    pub release_enable: Option<bool>,
    pub client_token: Option<String>,
}

impl UpdateRuntimeParams {
    pub fn to_request(&self) -> Result<UpdateRuntimeRequest, ApiError> {
        let authorizer_configuration = match self.authorizer_configuration.as_deref().filter(|text| !text.trim().is_empty()) {
            Some(text) => Some(AuthorizerConfiguration::from_json_argument(text)?),
            None => None,
        };
        Ok(UpdateRuntimeRequest {
            runtime_id: self.runtime_id.clone(),
            description: self.description.clone(),
            artifact_url: self.artifact_url.clone(),
            role_name: self.role_name.clone(),
            authorizer_configuration,
            envs: KeyValue::list_from_json_argument("envs", self.envs.as_deref())?,
            tags: KeyValue::list_from_json_argument("tags", self.tags.as_deref())?,
            release_enable: self.release_enable,
            client_token: self.client_token.clone(),
        })
    }
}

/// Parameters for `list_runtimes`.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListRuntimesParams {
    #[schemars(
        description = "JSON list of filters, e.g. [{\"Type\":\"Name\",\"Operator\":\"Contain\",\"Values\":[\"agent\"]}]."
    )]
    pub filters: Option<String>,
    #[schemars(description = "RFC 3339 timestamp.")]
    pub create_time_before: Option<String>,
    #[schemars(description = "RFC 3339 timestamp.")]
    pub create_time_after: Option<String>,
    #[schemars(description = "RFC 3339 timestamp.")]
    pub update_time_before: Option<String>,
    #[schemars(description = "RFC 3339 timestamp.")]
    pub update_time_after: Option<String>,
    #[schemars(description = "Pagination token from a previous page.")]
    pub next_token: Option<String>,
    #[serde(default = "default_max_results")]
    #[schemars(description = "Page size, at most 100.")]
    pub max_results: u32,
}

impl ListRuntimesParams {
    pub fn to_request(&self) -> Result<ListRuntimesRequest, ApiError> {
        Ok(ListRuntimesRequest {
            filters: parse_filters(self.filters.as_deref())?,
            create_time_before: self.create_time_before.clone(),
            create_time_after: self.create_time_after.clone(),
            update_time_before: self.update_time_before.clone(),
            update_time_after: self.update_time_after.clone(),
            next_token: self.next_token.clone(),
            max_results: Some(self.max_results),
        })
    }
}

/// Parameters naming one Runtime version.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RuntimeVersionParams {
    pub runtime_id: String,
    #[schemars(description = "Version number; omit for the latest draft (release) or the current version (inspection).")]
    pub version_number: Option<u32>,
}

/// Parameters for `list_runtime_versions`.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListRuntimeVersionsParams {
    pub runtime_id: String,
    pub next_token: Option<String>,
    #[serde(default = "default_max_results")]
    #[schemars(description = "Page size, at most 100.")]
    pub max_results: u32,
}

impl ListRuntimeVersionsParams {
    pub fn to_request(&self) -> ListRuntimeVersionsRequest {
        ListRuntimeVersionsRequest {
            runtime_id: self.runtime_id.clone(),
            next_token: self.next_token.clone(),
            max_results: Some(self.max_results),
        }
    }
}

/// Parameters for `toolkit_init_project`.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InitProjectParams {
    #[schemars(
        description = "Project name, default 'my_agent'. Lowercase letters, digits and underscores, starting with a letter; it becomes the Python module name."
    )]
    pub project_name: Option<String>,
    #[serde(default = "default_template")]
    pub template: String,
    #[schemars(description = "Target directory, default the server's working directory. Prefer an absolute path.")]
    pub directory: Option<String>,
}

/// Parameters for toolkit operations that only need the config file.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConfigFileParams {
    #[serde(default = "default_config_file")]
    #[schemars(description = "Path to agentkit.yaml. Prefer an absolute path; operations run in its directory.")]
    pub config_file: String,
}

/// Parameters for `toolkit_build_image`.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BuildImageParams {
    #[serde(default = "default_config_file")]
    #[schemars(description = "Path to agentkit.yaml. Prefer an absolute path; operations run in its directory.")]
    pub config_file: String,
    /// Build platform; the toolkit picks one itself.
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Push the image after building; the toolkit decides per workflow.
    #[serde(default = "default_true")]
    pub push: bool,
}

/// Parameters for `toolkit_invoke_agent`.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InvokeAgentParams {
    #[schemars(description = "JSON string sent to the agent, e.g. {\"prompt\": \"Hello, agent!\"}.")]
    pub payload: String,
    #[serde(default = "default_config_file")]
    pub config_file: String,
    #[schemars(description = "API key for cloud or hybrid Runtimes.")]
    pub apikey: Option<String>,
}

/// Parameters for `toolkit_destroy_runtime`.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DestroyRuntimeParams {
    #[serde(default = "default_config_file")]
    pub config_file: String,
    #[serde(default)]
    #[schemars(description = "Must be true; destroying terminates the running agent.")]
    pub force: bool,
}

/// Parameters for `toolkit_edit_config`.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EditConfigParams {
    #[serde(default = "default_config_file")]
    #[schemars(description = "Path to agentkit.yaml; created when missing. Prefer an absolute path.")]
    pub config_file: String,
    #[schemars(description = "Python entry point file.")]
    pub entry_point: Option<String>,
    #[schemars(description = "'local', 'cloud' or 'hybrid'.")]
    pub workflow_type: Option<String>,
    #[schemars(description = "Agent name stored as common.agent_name; also used for image naming.")]
    pub project_name: Option<String>,
    #[schemars(description = "Deprecated and ignored; use project_name.")]
    pub image_name: Option<String>,
    #[schemars(description = "Runtime name (cloud/hybrid).")]
    pub runtime_name: Option<String>,
    #[schemars(description = "IAM role name (cloud/hybrid).")]
    pub role_name: Option<String>,
    #[schemars(
        description = "Agent service port. For local workflows this maps host port to container port 8000; avoid 8000 itself, which this server commonly uses."
    )]
    pub entry_port: Option<u16>,
    #[schemars(description = "JSON string, {\"KEY\":\"value\"} or [{\"key\":\"KEY\",\"value\":\"value\"}]; replaces the current set.")]
    pub envs: Option<String>,
    pub ve_cr_instance_name: Option<String>,
    pub ve_cr_namespace_name: Option<String>,
    pub ve_cr_repo_name: Option<String>,
}

impl From<EditConfigParams> for ConfigEdit {
    fn from(params: EditConfigParams) -> Self {
        ConfigEdit {
            entry_point: params.entry_point,
            workflow_type: params.workflow_type,
            project_name: params.project_name,
            image_name: params.image_name,
            runtime_name: params.runtime_name,
            role_name: params.role_name,
            entry_port: params.entry_port,
            envs: params.envs,
            ve_cr_instance_name: params.ve_cr_instance_name,
            ve_cr_namespace_name: params.ve_cr_namespace_name,
            ve_cr_repo_name: params.ve_cr_repo_name,
        }
    }
}
