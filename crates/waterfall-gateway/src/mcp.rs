//! MCP gateway client.
//!
//! Tools are invoked with a JSON-RPC 2.0 `tools/call` request posted to an
//! HTTP MCP endpoint:
//!
//! ```text
//! {"jsonrpc":"2.0","id":"<uuid>","method":"tools/call",
//!  "params":{"name":"list_branches","arguments":{"owner":"octo","repo":"calc"}}}
//! ```
//!
//! Arguments are checked against the typed GitHub parameters before anything
//! is sent. JSON-RPC errors and `isError` results are both reported as errors.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use uuid::Uuid;

use waterfall_core::ToolAdapter;

use crate::error::{GatewayError, Result};
use crate::github;

pub const DEFAULT_MCP_URL: &str = "https://api.githubcopilot.com/mcp/";

pub const ENV_MCP_URL: &str = "WATERFALL_MCP_URL";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_OAUTH_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest<T> {
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    pub params: T,
}

impl<T> JsonRpcRequest<T> {
    pub fn new(method: impl Into<String>, params: T) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Uuid::new_v4().to_string(),
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse<T> {
    #[serde(default)]
    pub id: Value,
    pub result: Option<T>,
    pub error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl<T> JsonRpcResponse<T> {
    pub fn into_result(self) -> Result<T> {
        if let Some(error) = self.error {
            return Err(GatewayError::JsonRpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result
            .ok_or_else(|| GatewayError::Decode("neither result nor error present".to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Value,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl CallToolResult {
    /// Text items joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text { text } => Some(text.as_str()),
                ContentItem::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone)]
pub struct McpGatewayConfig {
    pub url: String,
    pub token: String,
    pub timeout: Duration,
}

impl fmt::Debug for McpGatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpGatewayConfig")
            .field("url", &self.url)
            .field("token", &"****")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl McpGatewayConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Read `WATERFALL_MCP_URL` (optional) and `GITHUB_OAUTH_TOKEN` (required).
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(ENV_GITHUB_TOKEN)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(GatewayError::MissingCredential(ENV_GITHUB_TOKEN))?;
        let url = std::env::var(ENV_MCP_URL).unwrap_or_else(|_| DEFAULT_MCP_URL.to_string());
        Ok(Self::new(url, token))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`ToolAdapter`] forwarding GitHub tool calls to an MCP server.
pub struct McpGateway {
    client: Client,
    config: McpGatewayConfig,
}

impl McpGateway {
    pub fn new(config: McpGatewayConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(McpGatewayConfig::from_env()?)
    }

    /// Validate and send one `tools/call`, returning the result text.
    #[instrument(skip(self, arguments), fields(tool = %name))]
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<String> {
        github::validate_arguments(name, arguments)?;

        let request = JsonRpcRequest::new(
            "tools/call",
            CallToolParams {
                name: name.to_string(),
                arguments: arguments.clone(),
            },
        );
        debug!(request_id = %request.id, "sending tools/call");

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.token)
            .header("Accept", "application/json, text/event-stream")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: JsonRpcResponse<CallToolResult> = serde_json::from_str(json_payload(&body))?;
        interpret(parsed)
    }
}

/// Streamable-HTTP servers may answer with a single SSE event instead of a
/// plain JSON body; take the last `data:` line in that case.
fn json_payload(body: &str) -> &str {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .last()
        .map(str::trim)
        .unwrap_or(body)
}

/// Turn a decoded `tools/call` response into text or an error.
fn interpret(response: JsonRpcResponse<CallToolResult>) -> Result<String> {
    let result = response.into_result()?;
    let text = result.text();
    if result.is_error {
        return Err(GatewayError::ToolFailed(text));
    }
    Ok(text)
}

#[async_trait]
impl ToolAdapter for McpGateway {
    async fn call(&self, tool_name: &str, input: &Value) -> std::result::Result<Value, String> {
        self.call_tool(tool_name, input)
            .await
            .map(Value::String)
            .map_err(|e| e.to_string())
    }
}
