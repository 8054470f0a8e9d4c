//! Contracts for the pipeline's external collaborators.
//!
//! The driver only ever talks to the language model, the tool layer and the
//! problem input through these traits. Implementations live outside the core
//! (see `waterfall-gateway`); tests inject scripted fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Message, ToolCallRequest};
use crate::tooling::ToolCatalog;

/// Failures of the language-model call. Always fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("completion API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("could not decode completion response: {0}")]
    Decode(String),

    #[error("completion response contained no choices")]
    EmptyResponse,
}

/// The language model.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Return one assistant message for `messages`, optionally carrying
    /// tool-call requests against `catalog`.
    async fn invoke(
        &self,
        messages: &[Message],
        catalog: &ToolCatalog,
    ) -> Result<Message, CompletionError>;
}

/// Outcome of one tool execution, recorded verbatim as a tool message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Executes tool-call requests. Failures are reported in the result, never
/// raised: tool errors are data for the model to react to.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    async fn execute(&self, request: &ToolCallRequest) -> ToolResult;
}

/// Source of the problem statement the client stage seeds the run with.
#[async_trait]
pub trait ProblemSource: Send + Sync {
    async fn collect_problem(&self) -> Result<String, String>;
}

/// A problem statement fixed up front.
#[derive(Debug, Clone)]
pub struct StaticProblem(pub String);

impl StaticProblem {
    pub fn new(problem: impl Into<String>) -> Self {
        Self(problem.into())
    }
}

#[async_trait]
impl ProblemSource for StaticProblem {
    async fn collect_problem(&self) -> Result<String, String> {
        Ok(self.0.clone())
    }
}
