//! Mutable state of one run, threaded through the driver loop.

use serde::Serialize;

use crate::domain::Transcript;
use crate::pipeline::roles::{AgentRole, Stage};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineState {
    pub transcript: Transcript,
    /// Stage the driver executes next.
    pub next_step: Stage,
    /// Last role whose handler ran; the tools stage returns to it.
    pub current_role: Option<AgentRole>,
    /// State transitions taken so far.
    pub transitions: usize,
}

impl PipelineState {
    /// Fresh run, starting at the client.
    pub fn new() -> Self {
        Self::with_transcript(Transcript::new(), Stage::Role(AgentRole::Client))
    }

    /// Resume from an existing transcript at `next_step`.
    pub fn with_transcript(transcript: Transcript, next_step: Stage) -> Self {
        Self {
            transcript,
            next_step,
            current_role: None,
            transitions: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.next_step == Stage::Done
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
