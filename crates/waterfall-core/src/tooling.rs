//! Tool catalog and catalog-backed dispatch.
//!
//! Provides the execution layer between the pipeline and a remote tool
//! gateway:
//! - a catalog of tool specs (name, description, JSON parameter schema)
//! - required-parameter validation against the schema
//! - a per-call timeout
//!
//! Every failure is folded into an error `ToolResult`, so the driver never
//! aborts a run because a tool misbehaved.

use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::ToolCallRequest;
use crate::services::{ToolDispatcher, ToolResult};

/// Whether a tool only reads remote state or changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCapability {
    Read,
    Write,
}

impl std::fmt::Display for ToolCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Tool spec in the catalog; `parameters` is a JSON Schema object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub capability: ToolCapability,
    pub parameters: Value,
}

impl ToolSpec {
    /// Names listed in the schema's top-level `required` array.
    pub fn required_fields(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Tools offered to the model, keyed and ordered by name.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: BTreeMap<String, ToolSpec>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ToolSpec) -> Result<(), ToolExecutionError> {
        if self.tools.contains_key(&spec.name) {
            return Err(ToolExecutionError::DuplicateTool {
                tool_name: spec.name,
            });
        }
        self.tools.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Execution controls for catalog dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolExecutionConfig {
    pub timeout_ms: u64,
}

impl Default for ToolExecutionConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

/// Execution failure taxonomy. Rendered into the tool message content.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolExecutionError {
    #[error("unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("duplicate tool registration: {tool_name}")]
    DuplicateTool { tool_name: String },

    #[error("tool '{tool_name}' is missing required parameter '{field}'")]
    MissingParameter { tool_name: String, field: String },

    #[error("tool '{tool_name}' timed out after {timeout_ms}ms")]
    Timeout { tool_name: String, timeout_ms: u64 },

    #[error("tool '{tool_name}' failed: {message}")]
    Adapter { tool_name: String, message: String },
}

/// Adapter contract for the actual remote invocation.
#[async_trait]
pub trait ToolAdapter: Send + Sync + 'static {
    async fn call(&self, tool_name: &str, input: &Value) -> std::result::Result<Value, String>;
}

/// [`ToolDispatcher`] that validates requests against a [`ToolCatalog`]
/// before handing them to a [`ToolAdapter`].
pub struct CatalogDispatcher<A: ToolAdapter> {
    catalog: ToolCatalog,
    adapter: A,
    config: ToolExecutionConfig,
}

impl<A: ToolAdapter> CatalogDispatcher<A> {
    pub fn new(catalog: ToolCatalog, adapter: A, config: ToolExecutionConfig) -> Self {
        Self {
            catalog,
            adapter,
            config,
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    async fn try_execute(&self, request: &ToolCallRequest) -> Result<Value, ToolExecutionError> {
        let spec = self
            .catalog
            .get(&request.name)
            .ok_or_else(|| ToolExecutionError::UnknownTool {
                tool_name: request.name.clone(),
            })?;

        if let Some(field) = spec
            .required_fields()
            .into_iter()
            .find(|f| !request.arguments.contains_key(*f))
        {
            return Err(ToolExecutionError::MissingParameter {
                tool_name: request.name.clone(),
                field: field.to_string(),
            });
        }

        let input = Value::Object(request.arguments.clone());
        let timeout = tokio::time::Duration::from_millis(self.config.timeout_ms);
        match tokio::time::timeout(timeout, self.adapter.call(&request.name, &input)).await {
            Err(_) => Err(ToolExecutionError::Timeout {
                tool_name: request.name.clone(),
                timeout_ms: self.config.timeout_ms,
            }),
            Ok(Err(message)) => Err(ToolExecutionError::Adapter {
                tool_name: request.name.clone(),
                message,
            }),
            Ok(Ok(output)) => Ok(output),
        }
    }
}

#[async_trait]
impl<A: ToolAdapter> ToolDispatcher for CatalogDispatcher<A> {
    async fn execute(&self, request: &ToolCallRequest) -> ToolResult {
        let started = Instant::now();
        let result = match self.try_execute(request).await {
            Ok(output) => ToolResult::ok(render_output(output)),
            Err(e) => ToolResult::error(e.to_string()),
        };
        debug!(
            tool = %request.name,
            call_id = %request.id,
            is_error = result.is_error,
            duration_ms = started.elapsed().as_millis() as u64,
            "tool call finished"
        );
        result
    }
}

/// Text shown to the model for a successful tool output.
fn render_output(output: Value) -> String {
    match output {
        Value::String(text) => text,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}
