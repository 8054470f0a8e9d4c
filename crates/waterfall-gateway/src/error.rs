//! Error types for waterfall-gateway

use thiserror::Error;

/// Errors that can occur talking to the completion API or the tool gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Required credential missing from the environment
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    /// Request could not be sent or the body could not be read
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success HTTP status
    #[error("gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON-RPC error object in the response
    #[error("MCP JSON-RPC error {code}: {message}")]
    JsonRpc { code: i32, message: String },

    /// The tool ran and reported failure (`isError`)
    #[error("MCP call failed: {0}")]
    ToolFailed(String),

    /// Arguments rejected by the typed parameter struct
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Tool name not in the GitHub tool set
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Response body did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Http(e.to_string())
    }
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
