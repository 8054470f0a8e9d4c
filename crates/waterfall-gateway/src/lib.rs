//! Waterfall Gateway
//!
//! Concrete collaborators for the Waterfall core:
//!
//! - [`openai`]: `OpenAiCompletionService`, the language model
//! - [`mcp`]: `McpGateway`, a `ToolAdapter` speaking MCP JSON-RPC over HTTP
//! - [`github`]: typed parameters for the GitHub tool set and `github_catalog()`

pub mod error;
pub mod github;
pub mod mcp;
pub mod openai;

pub use error::{GatewayError, Result};
pub use github::{github_catalog, validate_arguments, GithubTool, TOOL_NAMES};
pub use mcp::{McpGateway, McpGatewayConfig};
pub use openai::{OpenAiCompletionService, OpenAiConfig};
