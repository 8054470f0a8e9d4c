//! Domain models for Waterfall.
//!
//! - `Message`, `Role`, `ToolCallRequest`: the chat vocabulary
//! - `Transcript`: the append-only, invariant-checked record of one run

pub mod error;
pub mod message;
pub mod transcript;

pub use error::{ConfigError, TranscriptError};
pub use message::{Message, Role, ToolCallRequest};
pub use transcript::Transcript;
