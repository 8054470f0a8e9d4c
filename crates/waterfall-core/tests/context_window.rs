use std::collections::HashSet;

use proptest::prelude::*;
use waterfall_core::{
    build_payload, ContextWindowBuilder, Message, Payload, PromptSanitizer, Role,
    ToolCallRequest, Transcript, Window,
};

const SYSTEM: &str = "Role: Analyst.";

fn calls(ids: &[&str]) -> Message {
    Message::assistant_with_tool_calls(
        "",
        ids.iter()
            .map(|id| ToolCallRequest::new(*id, "list_branches"))
            .collect(),
    )
}

/// One assistant turn: a plain answer, or `n` tool requests.
#[derive(Debug, Clone, Copy)]
enum Turn {
    Plain,
    Calls(usize),
}

fn turn() -> impl Strategy<Value = Turn> {
    prop_oneof![Just(Turn::Plain), (1usize..=3).prop_map(Turn::Calls)]
}

/// Transcript shaped like a real run: a user message, then assistant turns
/// each followed by the results they asked for. Every request turn reuses the
/// ids "1".."n", so ids repeat across turns. When `tail_answered` is set, the
/// last request turn is left with only that many answers (mod n).
fn transcript_from(turns: &[Turn], tail_answered: Option<usize>) -> Transcript {
    let mut t = Transcript::new();
    t.append(Message::user("fix the login bug")).unwrap();
    for (i, turn) in turns.iter().enumerate() {
        match *turn {
            Turn::Plain => t.append(Message::assistant(format!("turn {i}"))).unwrap(),
            Turn::Calls(n) => {
                let ids: Vec<String> = (1..=n).map(|id| id.to_string()).collect();
                let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                t.append(calls(&refs)).unwrap();

                let answered = match tail_answered {
                    Some(a) if i + 1 == turns.len() => a % n,
                    _ => n,
                };
                for id in &ids[..answered] {
                    t.append(Message::tool_result(id.as_str(), format!("result {i}/{id}")))
                        .unwrap();
                }
            }
        }
    }
    t
}

fn transcript() -> impl Strategy<Value = Transcript> {
    (
        proptest::collection::vec(turn(), 0..12),
        proptest::option::of(0usize..3),
    )
        .prop_map(|(turns, tail)| transcript_from(&turns, tail))
}

/// Unvalidated message lists: stray system messages, orphan tool results and
/// unanswered requests all show up.
fn raw_messages() -> impl Strategy<Value = Vec<Message>> {
    let message = prop_oneof![
        Just(Message::user("u")),
        Just(Message::assistant("a")),
        Just(Message::system("stale prompt")),
        (1usize..=3).prop_map(|n| {
            let ids: Vec<String> = (1..=n).map(|id| id.to_string()).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            calls(&refs)
        }),
        (1u8..=4).prop_map(|id| Message::tool_result(id.to_string(), "r")),
    ];
    proptest::collection::vec(message, 0..16)
}

/// Every tool message is preceded, within `messages`, by a request for its id.
fn tools_are_owned(messages: &[Message]) -> bool {
    let mut issued = HashSet::new();
    messages.iter().all(|m| {
        issued.extend(m.tool_calls().iter().map(|c| c.id.clone()));
        !m.is_tool() || m.tool_call_id().is_some_and(|id| issued.contains(id))
    })
}

/// Every tool message belongs to the turn right before it: the nearest
/// non-tool message above it issued its id.
fn tools_follow_their_turn(messages: &[Message]) -> bool {
    messages.iter().enumerate().all(|(i, m)| {
        let Some(id) = m.tool_call_id() else {
            return true;
        };
        messages[..i]
            .iter()
            .rfind(|prev| !prev.is_tool())
            .is_some_and(|owner| owner.issues(id))
    })
}

/// `messages` does not end on an assistant turn with unanswered requests.
fn tail_is_closed(messages: &[Message]) -> bool {
    let tools_from = messages
        .iter()
        .rposition(|m| !m.is_tool())
        .map_or(0, |i| i + 1);
    let Some(owner) = tools_from.checked_sub(1).map(|i| &messages[i]) else {
        return true;
    };
    let answered: HashSet<&str> = messages[tools_from..]
        .iter()
        .filter_map(Message::tool_call_id)
        .collect();
    owner
        .tool_calls()
        .iter()
        .all(|c| answered.contains(c.id.as_str()))
}

fn refinalize(payload: &Payload) -> Payload {
    let body = payload.body();
    PromptSanitizer.finalize(SYSTEM, body, &Window::whole(body))
}

proptest! {
    #[test]
    fn window_never_starts_on_unowned_tool_message(t in transcript(), k in 0usize..40) {
        let w = ContextWindowBuilder::new(k).build(t.as_slice());
        prop_assert!(
            w.messages().first().map_or(true, |m| !m.is_tool()),
            "k={} window starts on a tool message: {:?}", k, w.messages()
        );
        prop_assert!(tools_follow_their_turn(w.messages()), "k={}", k);
        prop_assert!(
            w.messages().last().map_or(true, |m| !m.has_tool_calls()),
            "k={} window ends on a tool request", k
        );
        prop_assert_eq!(&t.as_slice()[w.start()..w.start() + w.len()], w.messages());
    }

    #[test]
    fn payload_is_always_protocol_valid(t in transcript(), k in 0usize..40) {
        let payload = build_payload(SYSTEM, t.as_slice(), k);
        let messages = payload.messages();
        prop_assert_eq!(&messages[0], &Message::system(SYSTEM));
        prop_assert_eq!(messages.iter().filter(|m| m.is_system()).count(), 1);
        prop_assert!(tools_follow_their_turn(payload.body()), "k={}", k);
        prop_assert!(tail_is_closed(payload.body()), "k={}: {:?}", k, payload.body());
        prop_assert_eq!(payload.is_degraded(), payload.body().is_empty());
    }

    #[test]
    fn sanitizer_is_idempotent(t in transcript(), k in 0usize..40) {
        let once = build_payload(SYSTEM, t.as_slice(), k);
        prop_assert_eq!(refinalize(&once), once);
    }

    #[test]
    fn sanitizer_repairs_raw_suffixes(t in transcript(), k in 0usize..40) {
        // A bare K-suffix, with no builder repair and no history before it.
        let full = t.as_slice();
        let suffix = &full[full.len() - k.min(full.len())..];
        let payload = PromptSanitizer.finalize(SYSTEM, suffix, &Window::whole(suffix));
        prop_assert!(payload.body().first().map_or(true, |m| !m.is_tool()), "k={}", k);
        prop_assert!(tools_follow_their_turn(payload.body()), "k={}", k);
        prop_assert!(tail_is_closed(payload.body()), "k={}", k);
    }

    #[test]
    fn sanitizer_cleans_unvalidated_lists(raw in raw_messages()) {
        let payload = PromptSanitizer.finalize(SYSTEM, &raw, &Window::whole(&raw));
        prop_assert_eq!(payload.messages().iter().filter(|m| m.is_system()).count(), 1);
        prop_assert!(payload.body().first().map_or(true, |m| !m.is_tool()));
        prop_assert!(tools_are_owned(payload.body()), "{:?}", payload.body());
        prop_assert!(tail_is_closed(payload.body()), "{:?}", payload.body());
        prop_assert_eq!(refinalize(&payload), payload);
    }
}

#[test]
fn scenario_b_trailing_request_is_dropped() {
    let full = vec![
        Message::user("fix bug"),
        Message::assistant("requirements"),
        calls(&["1"]),
    ];
    let payload = PromptSanitizer.finalize(SYSTEM, &full, &Window::whole(&full));
    assert_eq!(payload.body(), &full[..2]);
    assert_eq!(payload.messages().last(), Some(&Message::assistant("requirements")));

    let payload = build_payload(SYSTEM, &full, 40);
    assert_eq!(payload.body(), &full[..2]);
}

#[test]
fn scenario_c_window_extends_back_to_owner() {
    let full = Transcript::from_messages([
        Message::user("fix bug"),
        calls(&["3", "4", "5", "6", "7"]),
        Message::tool_result("3", "a"),
        Message::tool_result("4", "b"),
        Message::tool_result("5", "c"),
        Message::tool_result("6", "d"),
        Message::tool_result("7", "e"),
        Message::assistant("summary"),
    ])
    .unwrap();
    let full = full.as_slice();

    let naive_start = full.len() - 2;
    assert_eq!(full[naive_start].tool_call_id(), Some("7"));

    let w = ContextWindowBuilder::new(2).build(full);
    assert_eq!(naive_start - w.start(), 5);
    assert_eq!(w.messages()[0].role(), Role::Assistant);
    assert_eq!(w.len(), 7);

    let payload = build_payload(SYSTEM, full, 2);
    assert_eq!(payload.body(), &full[1..]);
}

#[test]
fn orphan_only_window_degrades_to_system_message() {
    let full = vec![Message::tool_result("1", "stray")];
    let payload = build_payload(SYSTEM, &full, 40);
    assert!(payload.is_degraded());
    assert_eq!(payload.messages(), &[Message::system(SYSTEM)]);
}
