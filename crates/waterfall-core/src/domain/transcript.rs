//! Append-only transcript of one pipeline run.
//!
//! Every append is checked against the pairing invariants of the chat
//! protocol, so a `Transcript` is valid at every point it can be observed:
//!
//! 1. every tool message answers a request issued by an earlier assistant
//!    message;
//! 2. an assistant message carrying tool calls is followed, before any other
//!    user or assistant message, by exactly one tool message per request, in
//!    request order.

use serde::Serialize;

use crate::domain::error::TranscriptError;
use crate::domain::message::{Message, Role, ToolCallRequest};

/// Assistant turn whose tool calls are not all answered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenTurn {
    /// Index of the assistant message that issued the requests.
    owner: usize,
    /// Position in the owner's `tool_calls` of the next expected answer.
    next: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
    #[serde(skip)]
    open: Option<OpenTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transcript by appending `messages` in order.
    pub fn from_messages(
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<Self, TranscriptError> {
        let mut transcript = Self::new();
        for message in messages {
            transcript.append(message)?;
        }
        Ok(transcript)
    }

    /// Append one message, rejecting it if it would break an invariant.
    pub fn append(&mut self, message: Message) -> Result<(), TranscriptError> {
        match message.role() {
            Role::System => Err(TranscriptError::SystemMessage),
            Role::Tool => self.append_tool_result(message),
            Role::User | Role::Assistant => {
                if self.open.is_some() {
                    return Err(TranscriptError::UnansweredToolCalls {
                        role: message.role(),
                        pending: self.pending_tool_calls().iter().map(|c| c.id.clone()).collect(),
                    });
                }
                if let Some(id) = first_duplicate_id(message.tool_calls()) {
                    return Err(TranscriptError::DuplicateToolCallId { id });
                }
                if message.has_tool_calls() {
                    self.open = Some(OpenTurn {
                        owner: self.messages.len(),
                        next: 0,
                    });
                }
                self.messages.push(message);
                Ok(())
            }
        }
    }

    fn append_tool_result(&mut self, message: Message) -> Result<(), TranscriptError> {
        let id = message
            .tool_call_id()
            .ok_or(TranscriptError::MissingToolCallId)?;
        let Some(mut turn) = self.open else {
            return Err(TranscriptError::OrphanToolResult { id: id.to_string() });
        };

        let requests = self.messages[turn.owner].tool_calls();
        let expected = &requests[turn.next].id;
        if expected != id {
            return Err(if requests.iter().any(|c| c.id == id) {
                TranscriptError::OutOfOrderToolResult {
                    expected: expected.clone(),
                    got: id.to_string(),
                }
            } else {
                TranscriptError::OrphanToolResult { id: id.to_string() }
            });
        }

        turn.next += 1;
        self.open = (turn.next < requests.len()).then_some(turn);
        self.messages.push(message);
        Ok(())
    }

    /// Requests of the latest assistant turn that still await a tool message.
    pub fn pending_tool_calls(&self) -> &[ToolCallRequest] {
        match self.open {
            Some(turn) => &self.messages[turn.owner].tool_calls()[turn.next..],
            None => &[],
        }
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

fn first_duplicate_id(calls: &[ToolCallRequest]) -> Option<String> {
    let mut seen = std::collections::HashSet::new();
    calls
        .iter()
        .find(|c| !seen.insert(c.id.as_str()))
        .map(|c| c.id.clone())
}
