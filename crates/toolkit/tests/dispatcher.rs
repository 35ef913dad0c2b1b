use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use agentkit_toolkit::{
    ConfigEdit, InvokeOutcome, InvokeRequest, Toolkit, Workflow, WorkflowContext, WorkflowKind, WorkflowProvider,
};
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Workflow double that records calls and answers from fixed outcomes.
#[derive(Default)]
struct ScriptedWorkflow {
    build_ok: bool,
    deploy_ok: bool,
    deploy_raises: Option<String>,
    /// Written over the config file during build.
    rewrite_on_build: Option<String>,
    status: Value,
    calls: Mutex<Vec<String>>,
    deploy_settings: Mutex<Vec<Value>>,
    invoke_requests: Mutex<Vec<InvokeRequest>>,
}

impl ScriptedWorkflow {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Workflow for ScriptedWorkflow {
    async fn build(&self, context: &WorkflowContext) -> anyhow::Result<bool> {
        self.calls.lock().unwrap().push(format!("build:{}", context.kind));
        if let Some(content) = &self.rewrite_on_build {
            fs::write(&context.config_path, content)?;
        }
        Ok(self.build_ok)
    }

    async fn deploy(&self, context: &WorkflowContext) -> anyhow::Result<bool> {
        self.calls.lock().unwrap().push(format!("deploy:{}", context.kind));
        self.deploy_settings.lock().unwrap().push(context.settings.clone());
        if let Some(message) = &self.deploy_raises {
            return Err(anyhow!(message.clone()).context("docker run failed"));
        }
        Ok(self.deploy_ok)
    }

    async fn invoke(&self, _context: &WorkflowContext, request: InvokeRequest) -> anyhow::Result<InvokeOutcome> {
        self.calls.lock().unwrap().push("invoke".to_string());
        let outcome = match &request {
            InvokeRequest::Cloud { .. } => InvokeOutcome::Cloud {
                success: true,
                result: json!({"reply": "hello"}),
            },
            InvokeRequest::Hybrid { .. } => InvokeOutcome::Hybrid { success: false },
        };
        self.invoke_requests.lock().unwrap().push(request);
        Ok(outcome)
    }

    async fn status(&self, _context: &WorkflowContext) -> anyhow::Result<Value> {
        self.calls.lock().unwrap().push("status".to_string());
        Ok(self.status.clone())
    }

    async fn destroy(&self, _context: &WorkflowContext) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("destroy".to_string());
        Ok(())
    }
}

struct SingleWorkflow(Arc<ScriptedWorkflow>);

impl WorkflowProvider for SingleWorkflow {
    fn workflow(&self, _kind: WorkflowKind) -> Arc<dyn Workflow> {
        self.0.clone()
    }
}

fn toolkit(workflow: ScriptedWorkflow) -> (Arc<ScriptedWorkflow>, Toolkit) {
    let workflow = Arc::new(workflow);
    (workflow.clone(), Toolkit::new(Arc::new(SingleWorkflow(workflow))))
}

fn config(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agentkit.yaml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

const LOCAL: &str = "common:\n  agent_name: weather\n  entry_point: app.py\n  current_workflow: local\n";
const CLOUD: &str = "\
common:
  agent_name: weather
  entry_point: app.py
  current_workflow: cloud
launch_types:
  cloud:
    ve_runtime_id: r-abc123
    ve_runtime_apikey_name: X-Agent-Key
";

#[tokio::test]
async fn launch_stops_when_build_fails() {
    let (workflow, toolkit) = toolkit(ScriptedWorkflow {
        build_ok: false,
        deploy_ok: true,
        ..Default::default()
    });
    let (_dir, path) = config(LOCAL);

    let envelope = toolkit.launch_agent(arg(&path)).await;

    assert_eq!(
        envelope.into_value(),
        json!({"success": false, "error": "Build failed. Launch aborted.", "stage": "build", "workflow": "local"})
    );
    assert_eq!(workflow.calls(), vec!["build:local"]);
}

#[tokio::test]
async fn launch_deploys_with_what_the_build_wrote_back() {
    let rebuilt = format!("{CLOUD}    ve_cr_image_full_url: cr.example.com/agents/weather:20251103\n");
    let (workflow, toolkit) = toolkit(ScriptedWorkflow {
        build_ok: true,
        deploy_ok: true,
        rewrite_on_build: Some(rebuilt),
        ..Default::default()
    });
    let (_dir, path) = config(CLOUD);

    let envelope = toolkit.launch_agent(arg(&path)).await;

    assert!(envelope.is_success());
    assert_eq!(envelope.get("message"), Some(&json!("Launch completed successfully (build + deploy)")));
    assert_eq!(workflow.calls(), vec!["build:cloud", "deploy:cloud"]);
    let deployed = workflow.deploy_settings.lock().unwrap();
    assert_eq!(deployed[0]["ve_cr_image_full_url"], json!("cr.example.com/agents/weather:20251103"));
}

#[tokio::test]
async fn launch_reports_deploy_stage() {
    let (_, toolkit) = toolkit(ScriptedWorkflow {
        build_ok: true,
        deploy_ok: false,
        ..Default::default()
    });
    let (_dir, path) = config(LOCAL);

    let envelope = toolkit.launch_agent(arg(&path)).await;

    assert_eq!(envelope.get("stage"), Some(&json!("deploy")));
    assert_eq!(envelope.get("error"), Some(&json!("Deploy failed. Build succeeded but deploy failed.")));
}

#[tokio::test]
async fn deploy_failure_carries_workflow_hints() {
    let (_, toolkit) = toolkit(ScriptedWorkflow::default());
    let (_dir, path) = config(LOCAL);

    let envelope = toolkit.deploy_agent(arg(&path)).await;

    assert!(!envelope.is_success());
    assert_eq!(
        envelope.get("hints"),
        Some(&json!([
            "Check if image exists",
            "Check if port is already in use",
            "Check Docker daemon logs for details"
        ]))
    );
}

#[tokio::test]
async fn raised_deploy_errors_are_classified() {
    let (_, toolkit) = toolkit(ScriptedWorkflow {
        deploy_raises: Some("bind 0.0.0.0:8100: address already in use".to_string()),
        ..Default::default()
    });
    let (_dir, path) = config(LOCAL);

    let envelope = toolkit.deploy_agent(arg(&path)).await;

    assert_eq!(
        envelope.get("error"),
        Some(&json!(
            "Deploy error: Port conflict detected: docker run failed: bind 0.0.0.0:8100: address already in use"
        ))
    );
    assert_eq!(
        envelope.get("error_chain"),
        Some(&json!(["docker run failed", "bind 0.0.0.0:8100: address already in use"]))
    );
}

#[tokio::test]
async fn operations_need_an_entry_point() {
    let (workflow, toolkit) = toolkit(ScriptedWorkflow::default());
    let (_dir, path) = config("common:\n  current_workflow: local\n  entry_point: ''\n");

    let build = toolkit.build_image(arg(&path)).await;
    let deploy = toolkit.deploy_agent(arg(&path)).await;

    assert_eq!(build.get("error"), Some(&json!("Entry point not configured, cannot build image")));
    assert_eq!(deploy.get("hint"), Some(&json!("Use toolkit_edit_config to set entry_point")));
    assert!(workflow.calls().is_empty());
}

#[tokio::test]
async fn missing_config_file_comes_with_a_hint() {
    let (_, toolkit) = toolkit(ScriptedWorkflow::default());
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("agentkit.yaml");

    let envelope = toolkit.get_status(arg(&missing)).await;

    assert_eq!(envelope.get("error"), Some(&json!(format!("Configuration file not found: {}", missing.display()))));
    assert_eq!(envelope.get("hint"), Some(&json!("Please check if the config_file path is correct.")));
}

#[tokio::test]
async fn unknown_workflow_lists_available_ones() {
    let (workflow, toolkit) = toolkit(ScriptedWorkflow::default());
    let (_dir, path) = config("common:\n  entry_point: app.py\n  current_workflow: staging\n");

    let envelope = toolkit.build_image(arg(&path)).await;

    assert_eq!(
        envelope.into_value(),
        json!({
            "success": false,
            "error": "Unknown workflow type 'staging'",
            "available_workflows": ["local", "cloud", "hybrid"]
        })
    );
    assert!(workflow.calls().is_empty());
}

#[tokio::test]
async fn cloud_invoke_uses_the_configured_key_header() {
    let (workflow, toolkit) = toolkit(ScriptedWorkflow::default());
    let (_dir, path) = config(CLOUD);

    let envelope = toolkit.invoke_agent(arg(&path), r#"{"prompt": "hi"}"#, Some("secret")).await;

    assert_eq!(envelope.get("result"), Some(&json!({"reply": "hello"})));
    let requests = workflow.invoke_requests.lock().unwrap();
    match &requests[0] {
        InvokeRequest::Cloud { payload, headers } => {
            assert_eq!(payload, &json!({"prompt": "hi"}));
            assert_eq!(headers.get("X-Agent-Key").map(String::as_str), Some("secret"));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[tokio::test]
async fn cloud_invoke_defaults_the_key_header() {
    let (workflow, toolkit) = toolkit(ScriptedWorkflow::default());
    let (_dir, path) = config("common:\n  current_workflow: cloud\n");

    toolkit.invoke_agent(arg(&path), "{}", Some("secret")).await;

    let requests = workflow.invoke_requests.lock().unwrap();
    let InvokeRequest::Cloud { headers, .. } = &requests[0] else {
        panic!("expected a cloud request");
    };
    assert_eq!(headers.keys().collect::<Vec<_>>(), vec!["X-API-Key"]);
}

#[tokio::test]
async fn hybrid_invoke_failure_is_reported() {
    let (workflow, toolkit) = toolkit(ScriptedWorkflow::default());
    let (_dir, path) = config("common:\n  current_workflow: hybrid\n");

    let envelope = toolkit.invoke_agent(arg(&path), r#"{"prompt": "hi"}"#, None).await;

    assert_eq!(envelope.get("error"), Some(&json!("Invoke failed. Check if agent is deployed and running.")));
    assert_eq!(
        workflow.invoke_requests.lock().unwrap()[0],
        InvokeRequest::Hybrid {
            payload: json!({"prompt": "hi"}),
            apikey: None
        }
    );
}

#[tokio::test]
async fn invoke_rejects_bad_payloads_and_local_workflows() {
    let (workflow, toolkit) = toolkit(ScriptedWorkflow::default());
    let (_dir, path) = config(LOCAL);

    let bad_payload = toolkit.invoke_agent(arg(&path), "{prompt", None).await;
    let local = toolkit.invoke_agent(arg(&path), "{}", None).await;

    let error = bad_payload.get("error").and_then(Value::as_str).unwrap();
    assert!(error.starts_with("Invalid payload JSON: "));
    assert_eq!(local.get("error"), Some(&json!("Invoke not supported for local workflow")));
    assert!(workflow.calls().is_empty());
}

#[tokio::test]
async fn status_error_becomes_an_error_envelope() {
    let (_, toolkit) = toolkit(ScriptedWorkflow {
        status: json!({"error": "Runtime ID not configured"}),
        ..Default::default()
    });
    let (_dir, path) = config(CLOUD);

    let envelope = toolkit.get_status(arg(&path)).await;

    assert_eq!(
        envelope.into_value(),
        json!({"success": false, "error": "Runtime ID not configured", "workflow": "cloud"})
    );
}

#[tokio::test]
async fn status_success_wraps_the_status_object() {
    let (_, toolkit) = toolkit(ScriptedWorkflow {
        status: json!({"status": "Ready", "endpoint": "https://r-abc123.example.com"}),
        ..Default::default()
    });
    let (_dir, path) = config(CLOUD);

    let envelope = toolkit.get_status(arg(&path)).await;

    assert_eq!(
        envelope.into_value(),
        json!({
            "success": true,
            "workflow": "cloud",
            "status": {"status": "Ready", "endpoint": "https://r-abc123.example.com"}
        })
    );
}

#[tokio::test]
async fn destroy_requires_force() {
    let (workflow, toolkit) = toolkit(ScriptedWorkflow::default());
    let (_dir, path) = config(LOCAL);

    let refused = toolkit.destroy_runtime(arg(&path), false).await;
    assert_eq!(refused.get("warning"), Some(&json!("This will terminate your running agent!")));
    assert!(workflow.calls().is_empty());

    let destroyed = toolkit.destroy_runtime(arg(&path), true).await;
    assert_eq!(destroyed.get("message"), Some(&json!("local runtime destroyed successfully")));
    assert_eq!(workflow.calls(), vec!["destroy"]);
}

#[test]
fn edit_without_updates_is_an_error() {
    let (_, toolkit) = toolkit(ScriptedWorkflow::default());
    let (_dir, path) = config(LOCAL);

    let envelope = toolkit.edit_config(arg(&path), &ConfigEdit::default());

    assert_eq!(envelope.into_value(), json!({"success": false, "error": "No updates provided"}));
    assert_eq!(fs::read_to_string(&path).unwrap(), LOCAL);
}

#[test]
fn edit_reports_updated_fields_and_file_path() {
    let (_, toolkit) = toolkit(ScriptedWorkflow::default());
    let (_dir, path) = config(LOCAL);

    let envelope = toolkit.edit_config(arg(&path), &ConfigEdit {
        entry_port: Some(8100),
        ..Default::default()
    });

    assert_eq!(
        envelope.get("message"),
        Some(&json!("Configuration updated: common.entry_port -> 8100, launch_types.local.ports -> [8100:8000]"))
    );
    assert_eq!(envelope.get("file_path"), Some(&json!(path.display().to_string())));
    assert_eq!(envelope.get("config").unwrap()["launch_types"]["local"]["ports"], json!(["8100:8000"]));
}

#[test]
fn init_project_reports_the_created_file() {
    let (_, toolkit) = toolkit(ScriptedWorkflow::default());
    let dir = tempfile::tempdir().unwrap();

    let envelope = toolkit.init_project(Some("weather_bot"), None, dir.path().to_str());

    assert_eq!(envelope.get("message"), Some(&json!("Successfully created weather_bot.py")));
    assert!(dir.path().join("weather_bot.py").exists());
}
