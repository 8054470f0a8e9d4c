//! Bounded, protocol-valid views of a transcript.

use crate::context::repair::repair_leading;
use crate::domain::Message;

/// A contiguous run of transcript messages, remembering where it starts in
/// the transcript it was cut from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a> {
    start: usize,
    messages: &'a [Message],
}

impl<'a> Window<'a> {
    /// Window covering every message of `messages`.
    pub fn whole(messages: &'a [Message]) -> Self {
        Self { start: 0, messages }
    }

    /// Index of the first windowed message in the full transcript.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn messages(&self) -> &'a [Message] {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Cuts the last `size` messages of a transcript and repairs both ends.
///
/// - A window that would start on a tool message is extended backwards,
///   through the full transcript, to the assistant message that issued the
///   request. Orphaned leading tool messages are skipped instead.
/// - A window ending on an assistant message with tool calls drops that
///   message: its requests are unanswered inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindowBuilder {
    size: usize,
}

impl ContextWindowBuilder {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    pub fn build<'a>(&self, transcript: &'a [Message]) -> Window<'a> {
        let naive_start = transcript.len().saturating_sub(self.size);
        let start = repair_leading(transcript, naive_start);

        let mut end = transcript.len().max(start);
        if end > start && transcript[end - 1].has_tool_calls() {
            end -= 1;
        }

        Window {
            start,
            messages: &transcript[start..end],
        }
    }
}
