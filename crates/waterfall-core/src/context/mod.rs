//! Context preparation for role invocations.
//!
//! - **window**: `ContextWindowBuilder`, `Window`: bounded transcript views
//! - **sanitizer**: `PromptSanitizer`, `Payload`: the authoritative final pass
//! - **repair**: boundary repairs shared by both

mod repair;
mod sanitizer;
mod window;

pub use sanitizer::{Payload, PromptSanitizer};
pub use window::{ContextWindowBuilder, Window};

use crate::domain::Message;

/// Window the transcript to `window_size` messages and finalize the payload
/// for a role whose system prompt is `system_prompt`.
pub fn build_payload(system_prompt: &str, transcript: &[Message], window_size: usize) -> Payload {
    let window = ContextWindowBuilder::new(window_size).build(transcript);
    PromptSanitizer.finalize(system_prompt, transcript, &window)
}
