//! Domain-level error taxonomy for Waterfall.

use crate::domain::message::Role;

/// Appends rejected because they would break the transcript invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("system messages are not part of the transcript")]
    SystemMessage,

    #[error("tool result {id} answers no open tool-call request")]
    OrphanToolResult { id: String },

    #[error("tool result {got} arrived out of order, expected {expected}")]
    OutOfOrderToolResult { expected: String, got: String },

    #[error("{role} message appended while tool calls are unanswered: {pending:?}")]
    UnansweredToolCalls { role: Role, pending: Vec<String> },

    #[error("assistant message repeats tool-call id {id}")]
    DuplicateToolCallId { id: String },

    #[error("tool message is missing its tool_call_id")]
    MissingToolCallId,
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    MustBePositive { field: &'static str },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}
