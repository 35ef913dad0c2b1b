use std::sync::Arc;

use agentkit_api::{ApiError, RuntimeApi, RuntimeService};
use agentkit_toolkit::{ConfigEdit, Toolkit, WorkflowProvider};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, ErrorData, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, tool, tool_handler, tool_router};
use serde_json::Value;
use tracing::debug;

use crate::server::results::{finish_call, runtime_envelope};
use crate::server::schemas::{
    BuildImageParams, ConfigFileParams, CreateRuntimeParams, DestroyRuntimeParams, EditConfigParams, InitProjectParams,
    InvokeAgentParams, ListRuntimeVersionsParams, ListRuntimesParams, RuntimeIdParams, RuntimeVersionParams, UpdateRuntimeParams,
};

const INSTRUCTIONS: &str = "AgentKit platform tools.\n\
RUNTIME MANAGEMENT (cloud OpenAPI):\n\
- create_runtime, get_runtime, update_runtime, delete_runtime, list_runtimes.\n\
- release_runtime publishes the latest draft, or rolls back when version_number is given.\n\
- get_runtime_version, list_runtime_versions inspect version history.\n\
- JSON-typed arguments (authorizer_configuration, envs, tags, filters) are JSON strings; PascalCase or snake_case keys.\n\
LOCAL TOOLKIT (agentkit.yaml):\n\
1) toolkit_init_project creates an agent file.\n\
2) toolkit_edit_config sets entry_point, workflow_type (local|cloud|hybrid), ports, envs and registry fields.\n\
3) toolkit_launch_agent builds then deploys (or toolkit_build_image + toolkit_deploy_agent).\n\
4) toolkit_get_status, toolkit_invoke_agent, toolkit_destroy_runtime (force=true).\n\
Always pass config_file as an absolute path.\n\
RESULTS: every tool returns JSON with a success flag and either a payload or an error string.";

/// Shared services behind every tool handler.
#[derive(Debug, Clone)]
pub struct McpServices {
    runtime: RuntimeService,
    toolkit: Toolkit,
}

impl McpServices {
    /// `runtime_api` reaches the cloud OpenAPI; `workflows` runs the local toolkit.
    pub fn new(runtime_api: Arc<dyn RuntimeApi>, workflows: Arc<dyn WorkflowProvider>) -> Self {
        Self {
            runtime: RuntimeService::new(runtime_api),
            toolkit: Toolkit::new(workflows),
        }
    }
}

#[derive(Clone)]
pub struct AgentKitMcpCore {
    tool_router: ToolRouter<Self>,
    services: Arc<McpServices>,
}

impl std::fmt::Debug for AgentKitMcpCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentKitMcpCore").finish_non_exhaustive()
    }
}

#[tool_router]
impl AgentKitMcpCore {
    pub fn new(services: Arc<McpServices>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            services,
        }
    }

    #[tool(
        annotations(open_world_hint = true),
        description = "Create an AgentKit Runtime (managed container for an agent). Requires name, artifact_type (image|tos), artifact_url, role_name and authorizer_configuration (JSON string with KeyAuth or CustomJwtAuthorizer). Optional: description, envs/tags (JSON lists of {Key, Value}), apmplus_enable, command, project_name, client_token. Returns the new runtime_id; status starts as Creating."
    )]
    async fn create_runtime(&self, param: Parameters<CreateRuntimeParams>) -> Result<CallToolResult, ErrorData> {
        let outcome: Result<Value, ApiError> = async {
            let request = param.0.to_request()?;
            self.services.runtime.create_runtime(&request).await
        }
        .await;
        Ok(finish_call("create_runtime", &param.0, runtime_envelope(outcome)))
    }

    #[tool(
        annotations(destructive_hint = true, open_world_hint = true),
        description = "Delete an AgentKit Runtime by runtime_id. The running agent is terminated."
    )]
    async fn delete_runtime(&self, param: Parameters<RuntimeIdParams>) -> Result<CallToolResult, ErrorData> {
        let outcome = self.services.runtime.delete_runtime(&param.0.runtime_id).await;
        Ok(finish_call("delete_runtime", &param.0, runtime_envelope(outcome)))
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "Get full details of an AgentKit Runtime: status, endpoint, artifact, envs, authorizer and current version."
    )]
    async fn get_runtime(&self, param: Parameters<RuntimeIdParams>) -> Result<CallToolResult, ErrorData> {
        let outcome = self.services.runtime.get_runtime(&param.0.runtime_id).await;
        Ok(finish_call("get_runtime", &param.0, runtime_envelope(outcome)))
    }

    #[tool(
        annotations(open_world_hint = true),
        description = "Update an AgentKit Runtime. Only supplied fields change: description, artifact_url, role_name, authorizer_configuration (JSON string), envs/tags (JSON lists of {Key, Value}), release_enable, client_token. Updates create a new draft version unless release_enable is true."
    )]
    async fn update_runtime(&self, param: Parameters<UpdateRuntimeParams>) -> Result<CallToolResult, ErrorData> {
        let outcome: Result<Value, ApiError> = async {
            let request = param.0.to_request()?;
            self.services.runtime.update_runtime(&request).await
        }
        .await;
        Ok(finish_call("update_runtime", &param.0, runtime_envelope(outcome)))
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "List AgentKit Runtimes. Optional filters (JSON list), create/update time bounds (RFC 3339), next_token and max_results (default 20). Returns runtimes and a next_token for pagination."
    )]
    async fn list_runtimes(&self, param: Parameters<ListRuntimesParams>) -> Result<CallToolResult, ErrorData> {
        let outcome: Result<Value, ApiError> = async {
            let request = param.0.to_request()?;
            self.services.runtime.list_runtimes(&request).await
        }
        .await;
        Ok(finish_call("list_runtimes", &param.0, runtime_envelope(outcome)))
    }

    #[tool(
        annotations(open_world_hint = true),
        description = "Release an AgentKit Runtime version. Without version_number the latest draft is published; with version_number the Runtime rolls back to that version."
    )]
    async fn release_runtime(&self, param: Parameters<RuntimeVersionParams>) -> Result<CallToolResult, ErrorData> {
        let outcome = self
            .services
            .runtime
            .release_runtime(&param.0.runtime_id, param.0.version_number)
            .await;
        Ok(finish_call("release_runtime", &param.0, runtime_envelope(outcome)))
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "Get one version of an AgentKit Runtime. Omit version_number for the current version."
    )]
    async fn get_runtime_version(&self, param: Parameters<RuntimeVersionParams>) -> Result<CallToolResult, ErrorData> {
        let outcome = self
            .services
            .runtime
            .get_runtime_version(&param.0.runtime_id, param.0.version_number)
            .await;
        Ok(finish_call("get_runtime_version", &param.0, runtime_envelope(outcome)))
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "List the version history of an AgentKit Runtime. Optional next_token and max_results (default 20)."
    )]
    async fn list_runtime_versions(&self, param: Parameters<ListRuntimeVersionsParams>) -> Result<CallToolResult, ErrorData> {
        let outcome = self.services.runtime.list_runtime_versions(&param.0.to_request()).await;
        Ok(finish_call("list_runtime_versions", &param.0, runtime_envelope(outcome)))
    }

    #[tool(
        description = "Create a new agent file <project_name>.py from a template (default name my_agent, template basic) in directory (default: server working directory). Never overwrites an existing file."
    )]
    async fn toolkit_init_project(&self, param: Parameters<InitProjectParams>) -> Result<CallToolResult, ErrorData> {
        let envelope = self.services.toolkit.init_project(
            param.0.project_name.as_deref(),
            Some(param.0.template.as_str()),
            param.0.directory.as_deref(),
        );
        Ok(finish_call("toolkit_init_project", &param.0, envelope))
    }

    #[tool(
        annotations(open_world_hint = true),
        description = "Build the agent image for the workflow selected in agentkit.yaml (local: Docker build; cloud: registry build pipeline). Runs in the config file's directory and may write image details back to the file. Requires common.entry_point."
    )]
    async fn toolkit_build_image(&self, param: Parameters<BuildImageParams>) -> Result<CallToolResult, ErrorData> {
        debug!(platform = %param.0.platform, push = param.0.push, "build options are chosen by the toolkit");
        let envelope = self.services.toolkit.build_image(&param.0.config_file).await;
        Ok(finish_call("toolkit_build_image", &param.0, envelope))
    }

    #[tool(
        annotations(open_world_hint = true),
        description = "Deploy the built agent (local: start the container; cloud/hybrid: create or update the Runtime). Run toolkit_build_image first. Failures include troubleshooting hints."
    )]
    async fn toolkit_deploy_agent(&self, param: Parameters<ConfigFileParams>) -> Result<CallToolResult, ErrorData> {
        let envelope = self.services.toolkit.deploy_agent(&param.0.config_file).await;
        Ok(finish_call("toolkit_deploy_agent", &param.0, envelope))
    }

    #[tool(
        annotations(open_world_hint = true),
        description = "Build then deploy in one step. Deploy is skipped when build fails; the result's stage field says which step failed."
    )]
    async fn toolkit_launch_agent(&self, param: Parameters<ConfigFileParams>) -> Result<CallToolResult, ErrorData> {
        let envelope = self.services.toolkit.launch_agent(&param.0.config_file).await;
        Ok(finish_call("toolkit_launch_agent", &param.0, envelope))
    }

    #[tool(
        annotations(open_world_hint = true),
        description = "Send a JSON payload string to the deployed agent (cloud or hybrid workflows). apikey is sent under the header named by ve_runtime_apikey_name (default X-API-Key)."
    )]
    async fn toolkit_invoke_agent(&self, param: Parameters<InvokeAgentParams>) -> Result<CallToolResult, ErrorData> {
        let envelope = self
            .services
            .toolkit
            .invoke_agent(&param.0.config_file, &param.0.payload, param.0.apikey.as_deref())
            .await;
        Ok(finish_call("toolkit_invoke_agent", &param.0, envelope))
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "Report the status of the agent described by agentkit.yaml."
    )]
    async fn toolkit_get_status(&self, param: Parameters<ConfigFileParams>) -> Result<CallToolResult, ErrorData> {
        let envelope = self.services.toolkit.get_status(&param.0.config_file).await;
        Ok(finish_call("toolkit_get_status", &param.0, envelope))
    }

    #[tool(
        annotations(destructive_hint = true, open_world_hint = true),
        description = "Destroy the running agent described by agentkit.yaml. Requires force=true; without it nothing happens."
    )]
    async fn toolkit_destroy_runtime(&self, param: Parameters<DestroyRuntimeParams>) -> Result<CallToolResult, ErrorData> {
        let envelope = self
            .services
            .toolkit
            .destroy_runtime(&param.0.config_file, param.0.force)
            .await;
        Ok(finish_call("toolkit_destroy_runtime", &param.0, envelope))
    }

    #[tool(
        description = "Edit agentkit.yaml, creating it when missing. Only supplied fields change: entry_point, workflow_type, project_name, entry_port, envs, and for cloud/hybrid runtime_name, role_name and ve_cr_* registry fields. For local workflows entry_port becomes the host side of a <port>:8000 mapping."
    )]
    async fn toolkit_edit_config(&self, param: Parameters<EditConfigParams>) -> Result<CallToolResult, ErrorData> {
        let config_file = param.0.config_file.clone();
        let logged = param.0.clone();
        let edit = ConfigEdit::from(param.0);
        let envelope = self.services.toolkit.edit_config(&config_file, &edit);
        Ok(finish_call("toolkit_edit_config", &logged, envelope))
    }
}

#[tool_handler]
impl ServerHandler for AgentKitMcpCore {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "agentkit-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("AgentKit Platform MCP Server".to_string()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_api::RuntimeAction;
    use agentkit_toolkit::{InvokeOutcome, InvokeRequest, Workflow, WorkflowContext, WorkflowKind};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRuntimeApi {
        calls: Mutex<Vec<(RuntimeAction, Value)>>,
    }

    #[async_trait]
    impl RuntimeApi for FakeRuntimeApi {
        async fn call(&self, action: RuntimeAction, body: Value) -> Result<Value, ApiError> {
            self.calls.lock().unwrap().push((action, body.clone()));
            match body.get("RuntimeId").and_then(Value::as_str) {
                Some("r-missing") => Err(ApiError::Service {
                    action: action.to_string(),
                    code: "NotFound".to_string(),
                    message: "runtime not found".to_string(),
                    request_id: Some("req-404".to_string()),
                }),
                _ => Ok(json!({"RuntimeId": "r-abc123", "Status": "Ready", "ArtifactType": "image"})),
            }
        }
    }

    struct NoopWorkflow;

    #[async_trait]
    impl Workflow for NoopWorkflow {
        async fn build(&self, _context: &WorkflowContext) -> anyhow::Result<bool> {
            Ok(false)
        }

        async fn deploy(&self, _context: &WorkflowContext) -> anyhow::Result<bool> {
            Ok(true)
        }

        async fn invoke(&self, _context: &WorkflowContext, _request: InvokeRequest) -> anyhow::Result<InvokeOutcome> {
            Ok(InvokeOutcome::Hybrid { success: true })
        }

        async fn status(&self, _context: &WorkflowContext) -> anyhow::Result<Value> {
            Ok(json!({"status": "Running"}))
        }

        async fn destroy(&self, _context: &WorkflowContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct NoopProvider;

    impl WorkflowProvider for NoopProvider {
        fn workflow(&self, _kind: WorkflowKind) -> Arc<dyn Workflow> {
            Arc::new(NoopWorkflow)
        }
    }

    fn core() -> (Arc<FakeRuntimeApi>, AgentKitMcpCore) {
        let api = Arc::new(FakeRuntimeApi::default());
        let services = McpServices::new(api.clone(), Arc::new(NoopProvider));
        (api, AgentKitMcpCore::new(Arc::new(services)))
    }

    fn envelope(result: &CallToolResult) -> Value {
        let text = result
            .content
            .first()
            .and_then(|content| content.as_text())
            .map(|text| text.text.clone())
            .unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn registers_every_tool() {
        let mut names: Vec<String> = AgentKitMcpCore::tool_router()
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "create_runtime",
                "delete_runtime",
                "get_runtime",
                "get_runtime_version",
                "list_runtime_versions",
                "list_runtimes",
                "release_runtime",
                "toolkit_build_image",
                "toolkit_deploy_agent",
                "toolkit_destroy_runtime",
                "toolkit_edit_config",
                "toolkit_get_status",
                "toolkit_init_project",
                "toolkit_invoke_agent",
                "toolkit_launch_agent",
                "update_runtime",
            ]
        );
    }

    #[tokio::test]
    async fn get_runtime_returns_snake_case_result() {
        let (_, core) = core();

        let result = core
            .get_runtime(Parameters(RuntimeIdParams {
                runtime_id: "r-abc123".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(false));
        assert_eq!(
            envelope(&result),
            json!({"success": true, "result": {"runtime_id": "r-abc123", "status": "Ready", "artifact_type": "image"}})
        );
    }

    #[tokio::test]
    async fn service_errors_become_error_envelopes() {
        let (_, core) = core();

        let result = core
            .delete_runtime(Parameters(RuntimeIdParams {
                runtime_id: "r-missing".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        let envelope = envelope(&result);
        assert_eq!(envelope["code"], json!("NotFound"));
        assert_eq!(envelope["request_id"], json!("req-404"));
    }

    #[tokio::test]
    async fn malformed_json_argument_never_reaches_the_api() {
        let (api, core) = core();
        let params: CreateRuntimeParams = serde_json::from_value(json!({
            "name": "weather",
            "artifact_type": "image",
            "artifact_url": "cr.example.com/agents/weather:1",
            "role_name": "AgentKitRole",
            "authorizer_configuration": "{\"KeyAuth\": "
        }))
        .unwrap();

        let result = core.create_runtime(Parameters(params)).await.unwrap();

        let error = envelope(&result)["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("Invalid JSON in 'authorizer_configuration'"));
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_accepts_snake_case_authorizer() {
        let (api, core) = core();
        let params: CreateRuntimeParams = serde_json::from_value(json!({
            "name": "weather",
            "artifact_type": "IMAGE",
            "artifact_url": "cr.example.com/agents/weather:1",
            "role_name": "AgentKitRole",
            "authorizer_configuration": "{\"key_auth\": {\"api_key\": \"secret\", \"api_key_location\": \"HEADER\"}}",
            "envs": "[{\"key\": \"MODEL\", \"value\": \"doubao\"}]"
        }))
        .unwrap();

        core.create_runtime(Parameters(params)).await.unwrap();

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls[0].0, RuntimeAction::Create);
        assert_eq!(
            calls[0].1["AuthorizerConfiguration"],
            json!({"KeyAuth": {"ApiKey": "secret", "ApiKeyLocation": "HEADER"}})
        );
        assert_eq!(calls[0].1["ArtifactType"], json!("image"));
        assert_eq!(calls[0].1["Envs"], json!([{"Key": "MODEL", "Value": "doubao"}]));
    }

    #[tokio::test]
    async fn list_runtimes_sends_default_page_size() {
        let (api, core) = core();
        let params: ListRuntimesParams = serde_json::from_value(json!({
            "filters": "[{\"type\": \"Name\", \"values\": [\"weather\"]}]"
        }))
        .unwrap();

        core.list_runtimes(Parameters(params)).await.unwrap();

        assert_eq!(
            api.calls.lock().unwrap()[0].1,
            json!({"Filters": [{"Type": "Name", "Values": ["weather"]}], "MaxResults": 20})
        );
    }

    #[tokio::test]
    async fn destroy_without_force_is_refused() {
        let (_, core) = core();
        let params: DestroyRuntimeParams = serde_json::from_value(json!({})).unwrap();

        let result = core.toolkit_destroy_runtime(Parameters(params)).await.unwrap();

        assert_eq!(result.is_error, Some(true));
        assert_eq!(envelope(&result)["warning"], json!("This will terminate your running agent!"));
    }

    #[tokio::test]
    async fn edit_then_launch_reports_build_stage() {
        let (_, core) = core();
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("agentkit.yaml").display().to_string();
        let params: EditConfigParams = serde_json::from_value(json!({
            "config_file": config_file,
            "entry_point": "app.py",
            "workflow_type": "local",
            "entry_port": 8100
        }))
        .unwrap();

        let edited = core.toolkit_edit_config(Parameters(params)).await.unwrap();
        assert_eq!(envelope(&edited)["success"], json!(true));

        let launched = core
            .toolkit_launch_agent(Parameters(ConfigFileParams { config_file }))
            .await
            .unwrap();
        assert_eq!(
            envelope(&launched),
            json!({"success": false, "error": "Build failed. Launch aborted.", "stage": "build", "workflow": "local"})
        );
    }

    #[test]
    fn server_info_advertises_tools() {
        let (_, core) = core();
        let info = core.get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "agentkit-mcp");
    }
}
