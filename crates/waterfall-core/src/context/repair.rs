//! Boundary repairs shared by the window builder and the sanitizer.

use std::borrow::Borrow;

use crate::domain::Message;

/// Move a window start off a leading tool message.
///
/// When `full[start]` is a tool message, returns the index of the assistant
/// message in `full` that issued its request, so the window includes the
/// whole turn. If that message cannot be found, skips past the leading run of
/// tool messages instead. Any other start is returned unchanged.
pub(crate) fn repair_leading(full: &[Message], start: usize) -> usize {
    let Some(first) = full.get(start).filter(|m| m.is_tool()) else {
        return start;
    };

    if let Some(owner) = first
        .tool_call_id()
        .and_then(|id| full[..start].iter().rposition(|m| m.issues(id)))
    {
        return owner;
    }

    let mut start = start;
    while full.get(start).is_some_and(Message::is_tool) {
        start += 1;
    }
    start
}

/// Length of `messages` once a trailing turn with unanswered tool calls is cut.
///
/// Looks at the last assistant message with tool calls that is followed only
/// by tool messages. If those tool messages do not answer every request, the
/// assistant message and its partial answers are dropped. Repeats until the
/// tail is stable.
pub(crate) fn trim_open_tail<M: Borrow<Message>>(messages: &[M]) -> usize {
    let mut end = messages.len();
    loop {
        let tools_from = messages[..end]
            .iter()
            .rposition(|m| !m.borrow().is_tool())
            .map_or(0, |i| i + 1);
        let Some(owner) = tools_from.checked_sub(1) else {
            return end;
        };
        let candidate = messages[owner].borrow();
        if !candidate.has_tool_calls() {
            return end;
        }

        let answers = &messages[tools_from..end];
        let all_answered = candidate
            .tool_calls()
            .iter()
            .all(|call| {
                answers
                    .iter()
                    .any(|m| m.borrow().tool_call_id() == Some(call.id.as_str()))
            });
        if all_answered {
            return end;
        }
        end = owner;
    }
}
