//! Error types for the pipeline driver.

use crate::domain::{ConfigError, TranscriptError};
use crate::pipeline::roles::AgentRole;
use crate::services::CompletionError;

/// Conditions that end a run. Tool failures are not among them.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("completion service failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("halted: step budget exceeded ({transitions} of {budget} transitions used)")]
    RunawayHalt { budget: usize, transitions: usize },

    #[error("transcript invariant violated: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("invalid model response: {reason}")]
    InvalidResponse { reason: String },

    #[error("problem statement is empty")]
    EmptyProblem,

    #[error("could not collect problem statement: {0}")]
    Input(String),

    #[error("tools stage entered without pending tool calls")]
    NoPendingToolCalls,

    #[error("role graph has no spec for {role}")]
    MissingRole { role: AgentRole },

    #[error("role graph lists {role} more than once")]
    DuplicateRole { role: AgentRole },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// `true` when the run was stopped by the step budget rather than failing.
    pub fn is_runaway(&self) -> bool {
        matches!(self, PipelineError::RunawayHalt { .. })
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
