use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use waterfall_core::{
    CatalogDispatcher, ToolAdapter, ToolCallRequest, ToolCapability, ToolCatalog,
    ToolDispatcher, ToolExecutionConfig, ToolSpec,
};

#[derive(Clone)]
enum Step {
    Return(Value),
    Err(&'static str),
    Sleep(u64),
}

#[derive(Clone)]
struct ScriptedAdapter {
    steps: Arc<Mutex<Vec<Step>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAdapter {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolAdapter for ScriptedAdapter {
    async fn call(&self, _tool_name: &str, _input: &Value) -> std::result::Result<Value, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut guard = self.steps.lock().await;
            if guard.is_empty() {
                Step::Err("no scripted step")
            } else {
                guard.remove(0)
            }
        };

        match step {
            Step::Return(v) => Ok(v),
            Step::Err(msg) => Err(msg.to_string()),
            Step::Sleep(ms) => {
                sleep(Duration::from_millis(ms)).await;
                Ok(json!("late"))
            }
        }
    }
}

fn catalog() -> ToolCatalog {
    let mut catalog = ToolCatalog::new();
    catalog
        .register(ToolSpec {
            name: "list_branches".to_string(),
            description: "List branches in a repository".to_string(),
            capability: ToolCapability::Read,
            parameters: json!({
                "type": "object",
                "properties": {"owner": {"type": "string"}, "repo": {"type": "string"}},
                "required": ["owner", "repo"],
            }),
        })
        .expect("register");
    catalog
}

fn list_branches() -> ToolCallRequest {
    ToolCallRequest::new("1", "list_branches")
        .with_argument("owner", "octo")
        .with_argument("repo", "calc")
}

fn dispatcher(adapter: ScriptedAdapter, timeout_ms: u64) -> CatalogDispatcher<ScriptedAdapter> {
    CatalogDispatcher::new(catalog(), adapter, ToolExecutionConfig { timeout_ms })
}

#[tokio::test]
async fn successful_output_is_rendered_as_text() {
    let adapter = ScriptedAdapter::new(vec![Step::Return(json!([{"name": "main"}]))]);
    let d = dispatcher(adapter.clone(), 1_000);

    let result = d.execute(&list_branches()).await;
    assert!(!result.is_error);
    assert!(result.content.contains("\"name\": \"main\""));
    assert_eq!(adapter.call_count(), 1);
}

#[tokio::test]
async fn unknown_tool_never_reaches_adapter() {
    let adapter = ScriptedAdapter::new(vec![]);
    let d = dispatcher(adapter.clone(), 1_000);

    let result = d.execute(&ToolCallRequest::new("9", "drop_database")).await;
    assert!(result.is_error);
    assert_eq!(result.content, "unknown tool: drop_database");
    assert_eq!(adapter.call_count(), 0);
}

#[tokio::test]
async fn missing_required_parameter_is_reported() {
    let adapter = ScriptedAdapter::new(vec![]);
    let d = dispatcher(adapter.clone(), 1_000);

    let request = ToolCallRequest::new("1", "list_branches").with_argument("owner", "octo");
    let result = d.execute(&request).await;
    assert!(result.is_error);
    assert!(result.content.contains("'repo'"), "got: {}", result.content);
    assert_eq!(adapter.call_count(), 0);
}

#[tokio::test]
async fn adapter_error_becomes_error_content() {
    let adapter = ScriptedAdapter::new(vec![Step::Err("404 Not Found")]);
    let d = dispatcher(adapter, 1_000);

    let result = d.execute(&list_branches()).await;
    assert!(result.is_error);
    assert_eq!(result.content, "tool 'list_branches' failed: 404 Not Found");
}

#[tokio::test(start_paused = true)]
async fn slow_adapter_times_out() {
    let adapter = ScriptedAdapter::new(vec![Step::Sleep(5_000)]);
    let d = dispatcher(adapter, 100);

    let result = d.execute(&list_branches()).await;
    assert!(result.is_error);
    assert!(result.content.contains("timed out after 100ms"));
}
