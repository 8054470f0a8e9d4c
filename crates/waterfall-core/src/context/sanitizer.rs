//! Final-mile validation of the payload sent to the completion service.
//!
//! The window builder is an optimisation; this module is authoritative. It
//! re-anchors the window in the full transcript and re-applies both boundary
//! repairs, so the payload it returns always:
//!
//! - starts with exactly one system message;
//! - contains, for every tool message, the assistant message that issued the
//!   request earlier in the payload;
//! - never ends on an assistant turn whose tool calls are unanswered.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::context::repair::{repair_leading, trim_open_tail};
use crate::context::window::Window;
use crate::domain::Message;

/// Exact message list for one role invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    messages: Vec<Message>,
    /// Set when every windowed message had to be dropped.
    degraded: bool,
}

impl Payload {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages after the leading system message.
    pub fn body(&self) -> &[Message] {
        &self.messages[1..]
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptSanitizer;

impl PromptSanitizer {
    /// Produce `[system] + window`, repaired against `full`.
    ///
    /// `window` must have been cut from `full`. Falls back to a payload made
    /// of the system message alone, with a warning, when nothing valid is left.
    pub fn finalize(&self, system_prompt: &str, full: &[Message], window: &Window<'_>) -> Payload {
        let end = (window.start() + window.len()).min(full.len());
        let start = repair_leading(full, window.start()).min(end);

        let mut body = Vec::with_capacity(end - start + 1);
        let mut issued: HashSet<&str> = HashSet::new();
        for message in &full[start..end] {
            if message.is_system() {
                warn!(event = "payload.system_dropped", "dropping system message found inside window");
                continue;
            }
            if message.is_tool() {
                let answered = message.tool_call_id().is_some_and(|id| issued.contains(id));
                if !answered {
                    warn!(
                        event = "payload.orphan_dropped",
                        tool_call_id = ?message.tool_call_id(),
                        "dropping tool message without its request"
                    );
                    continue;
                }
            }
            issued.extend(message.tool_calls().iter().map(|c| c.id.as_str()));
            body.push(message);
        }

        let keep = trim_open_tail(&body);
        body.truncate(keep);

        let degraded = body.is_empty();
        if degraded {
            warn!(
                event = "payload.degraded",
                window_len = window.len(),
                "no valid window left, sending system message only"
            );
        }

        let mut messages = Vec::with_capacity(body.len() + 1);
        messages.push(Message::system(system_prompt));
        messages.extend(body.into_iter().cloned());
        Payload { messages, degraded }
    }
}
