//! Role sequencing for a Waterfall run.
//!
//! # Module layout
//!
//! - [`roles`]: `AgentRole`, `Stage`, `RoleSpec` and the standard prompts
//! - [`graph`]: `RoleGraph`: the transition table
//! - [`state`]: `PipelineState`, threaded through the driver
//! - [`driver`]: `Pipeline`, `RunOutcome`: the driver loop
//! - [`error`]: `PipelineError`, `PipelineResult`

pub mod driver;
pub mod error;
pub mod graph;
pub mod roles;
pub mod state;

pub use driver::{Pipeline, RunOutcome, TOOLS_LABEL};
pub use error::{PipelineError, PipelineResult};
pub use graph::RoleGraph;
pub use roles::{AgentRole, RoleSpec, Stage};
pub use state::PipelineState;
