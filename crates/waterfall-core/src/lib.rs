//! Waterfall Core Library
//!
//! Orchestration core of the Waterfall pipeline: the transcript model, context
//! windowing and payload sanitizing, the role state machine and its driver,
//! and the contracts for the external collaborators.

pub mod config;
pub mod context;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod services;
pub mod telemetry;
pub mod tooling;
pub mod trace;

pub use config::PipelineConfig;
pub use context::{build_payload, ContextWindowBuilder, Payload, PromptSanitizer, Window};
pub use domain::{ConfigError, Message, Role, ToolCallRequest, Transcript, TranscriptError};
pub use metrics::PipelineMetrics;
pub use pipeline::{
    AgentRole, Pipeline, PipelineError, PipelineResult, PipelineState, RoleGraph, RoleSpec,
    RunOutcome, Stage,
};
pub use services::{
    CompletionError, CompletionService, ProblemSource, StaticProblem, ToolDispatcher, ToolResult,
};
pub use tooling::{
    CatalogDispatcher, ToolAdapter, ToolCapability, ToolCatalog, ToolExecutionConfig,
    ToolExecutionError, ToolSpec,
};
pub use trace::{
    FileTraceLogger, MemoryTraceLogger, NullTraceLogger, TeeTraceLogger, TraceError, TraceLogger,
};

/// Crate version, shared by every workspace member.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
