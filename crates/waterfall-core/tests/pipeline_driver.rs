use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::sync::Mutex;
use waterfall_core::{
    AgentRole, CompletionError, CompletionService, MemoryTraceLogger, Message, Pipeline,
    PipelineConfig, PipelineError, PipelineState, Role, Stage, StaticProblem, ToolCallRequest,
    ToolCatalog, ToolDispatcher, ToolResult, TraceError, TraceLogger, Transcript,
};

/// Completion service replaying a script, then repeating `fallback`.
struct ScriptedModel {
    script: Mutex<VecDeque<Result<Message, CompletionError>>>,
    fallback: Message,
    payloads: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    fn new(script: Vec<Result<Message, CompletionError>>) -> Self {
        Self::with_fallback(script, Message::assistant("done"))
    }

    fn with_fallback(script: Vec<Result<Message, CompletionError>>, fallback: Message) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            payloads: Mutex::new(Vec::new()),
        }
    }

    async fn payloads(&self) -> Vec<Vec<Message>> {
        self.payloads.lock().await.clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedModel {
    async fn invoke(
        &self,
        messages: &[Message],
        _catalog: &ToolCatalog,
    ) -> Result<Message, CompletionError> {
        self.payloads.lock().await.push(messages.to_vec());
        match self.script.lock().await.pop_front() {
            Some(step) => step,
            None => Ok(self.fallback.clone()),
        }
    }
}

/// Dispatcher answering by request id, recording the order it was called in.
struct ScriptedDispatcher {
    errors: Vec<(&'static str, &'static str)>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedDispatcher {
    fn new() -> Self {
        Self::failing(vec![])
    }

    fn failing(errors: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            errors,
            seen: Mutex::new(Vec::new()),
        }
    }

    async fn seen(&self) -> Vec<String> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl ToolDispatcher for ScriptedDispatcher {
    async fn execute(&self, request: &ToolCallRequest) -> ToolResult {
        self.seen.lock().await.push(request.id.clone());
        match self.errors.iter().find(|(id, _)| *id == request.id) {
            Some((_, text)) => ToolResult::error(*text),
            None => ToolResult::ok(format!("{} ok", request.name)),
        }
    }
}

struct BrokenTrace;

impl TraceLogger for BrokenTrace {
    fn append(&self, _: DateTime<Local>, _: &str, _: &Message) -> Result<(), TraceError> {
        Err(TraceError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}

fn calls(ids: &[&str]) -> Message {
    Message::assistant_with_tool_calls(
        "checking",
        ids.iter()
            .map(|id| {
                ToolCallRequest::new(*id, "list_branches")
                    .with_argument("owner", "octo")
                    .with_argument("repo", "calc")
            })
            .collect(),
    )
}

fn pipeline(model: Arc<ScriptedModel>, tools: Arc<ScriptedDispatcher>) -> Pipeline {
    Pipeline::new(model, tools, Arc::new(StaticProblem::new("fix bug")))
}

#[tokio::test]
async fn scenario_a_plain_analyst_response_goes_to_architect() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(Message::assistant("requirements"))]));
    let tools = Arc::new(ScriptedDispatcher::new());
    let p = pipeline(model.clone(), tools);

    let transcript = Transcript::from_messages([Message::user("fix bug")]).unwrap();
    let mut state = PipelineState::with_transcript(transcript, Stage::Role(AgentRole::Analyst));
    let next = p.step(&mut state).await.unwrap();

    assert_eq!(next, Stage::Role(AgentRole::Architect));
    assert_eq!(state.current_role, Some(AgentRole::Analyst));
    assert_eq!(state.transcript.len(), 2);

    let payloads = model.payloads().await;
    assert_eq!(payloads[0][0].role(), Role::System);
    assert!(payloads[0][0].content().starts_with("Role: Analyst."));
    assert_eq!(payloads[0][1], Message::user("fix bug"));
}

#[tokio::test]
async fn n_requests_yield_n_tool_messages_in_order() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(calls(&["a", "b", "c"]))]));
    let tools = Arc::new(ScriptedDispatcher::new());
    let p = pipeline(model, tools.clone());

    let transcript = Transcript::from_messages([Message::user("fix bug")]).unwrap();
    let mut state = PipelineState::with_transcript(transcript, Stage::Role(AgentRole::Programmer));
    state.next_step = p.step(&mut state).await.unwrap();
    assert_eq!(state.next_step, Stage::Tools);

    let back = p.step(&mut state).await.unwrap();
    assert_eq!(back, Stage::Role(AgentRole::Programmer));
    assert_eq!(tools.seen().await, vec!["a", "b", "c"]);

    let answered: Vec<&str> = state.transcript.as_slice()[2..]
        .iter()
        .map(|m| m.tool_call_id().unwrap())
        .collect();
    assert_eq!(answered, vec!["a", "b", "c"]);
    assert!(state.transcript.pending_tool_calls().is_empty());
}

#[tokio::test]
async fn full_run_with_tool_detour() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(calls(&["1"])),
        Ok(Message::assistant("requirements")),
        Ok(Message::assistant("plan")),
        Ok(Message::assistant("edits committed")),
        Ok(Message::assistant("tests pass")),
    ]));
    let tools = Arc::new(ScriptedDispatcher::new());
    let trace = Arc::new(MemoryTraceLogger::new());
    let p = pipeline(model.clone(), tools).with_trace(trace.clone());

    let outcome = p.run().await.unwrap();
    assert_eq!(outcome.transitions, 7);
    assert_eq!(outcome.transcript.len(), 7);
    assert!(!outcome.run_id.is_empty());

    let labels: Vec<String> = trace
        .lines()
        .iter()
        .map(|l| l[11..].split(':').next().unwrap().to_string())
        .collect();
    assert_eq!(
        labels,
        vec!["client", "analyst", "tools", "analyst", "architect", "programmer", "tester"]
    );

    // The re-invoked analyst sees its own request and the answer.
    let second = &model.payloads().await[1];
    assert_eq!(second.len(), 4);
    assert_eq!(second[3].tool_call_id(), Some("1"));

    assert_eq!(p.metrics().model_calls(), 5);
    assert_eq!(p.metrics().tool_calls(), 1);
    assert_eq!(p.metrics().transitions(), 7);
}

#[tokio::test]
async fn scenario_d_perpetual_tool_requests_halt_at_budget() {
    let model = Arc::new(ScriptedModel::with_fallback(vec![], calls(&["1"])));
    let tools = Arc::new(ScriptedDispatcher::new());
    let p = pipeline(model, tools).with_config(PipelineConfig::default().with_step_budget(60));

    let err = p.run().await.unwrap_err();
    match err {
        PipelineError::RunawayHalt {
            budget,
            transitions,
        } => {
            assert_eq!(budget, 60);
            assert_eq!(transitions, 60);
        }
        other => panic!("expected RunawayHalt, got {other:?}"),
    }
    // client, then analyst and tools alternating: 30 model calls, 29 dispatches.
    assert_eq!(p.metrics().transitions(), 60);
    assert_eq!(p.metrics().model_calls(), 30);
    assert_eq!(p.metrics().tool_calls(), 29);
}

#[tokio::test]
async fn budget_equal_to_run_length_completes() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let tools = Arc::new(ScriptedDispatcher::new());
    let p = pipeline(model, tools).with_config(PipelineConfig::default().with_step_budget(5));
    assert_eq!(p.run().await.unwrap().transitions, 5);

    let model = Arc::new(ScriptedModel::new(vec![]));
    let tools = Arc::new(ScriptedDispatcher::new());
    let p = pipeline(model, tools).with_config(PipelineConfig::default().with_step_budget(4));
    assert!(p.run().await.unwrap_err().is_runaway());
}

#[tokio::test]
async fn scenario_e_tool_error_is_visible_to_originating_role() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(calls(&["2", "3"])),
        Ok(Message::assistant("branch listing failed, assuming main")),
    ]));
    let tools = Arc::new(ScriptedDispatcher::failing(vec![("3", "404 Not Found")]));
    let p = pipeline(model.clone(), tools.clone());

    let outcome = p.run().await.unwrap();
    let error_message = &outcome.transcript.as_slice()[3];
    assert_eq!(error_message.tool_call_id(), Some("3"));
    assert_eq!(error_message.content(), "404 Not Found");

    // Both requests ran; the error did not cut the turn short.
    assert_eq!(tools.seen().await, vec!["2", "3"]);

    let reinvoked = &model.payloads().await[1];
    assert!(reinvoked.iter().any(|m| m.content() == "404 Not Found"));
    assert_eq!(p.metrics().tool_errors(), 1);
}

#[tokio::test]
async fn completion_failure_is_fatal() {
    let model = Arc::new(ScriptedModel::new(vec![Err(CompletionError::Api {
        status: 500,
        body: "upstream".to_string(),
    })]));
    let tools = Arc::new(ScriptedDispatcher::new());
    let p = pipeline(model, tools.clone());

    let err = p.run().await.unwrap_err();
    assert!(matches!(err, PipelineError::Completion(_)));
    assert!(!err.is_runaway());
    assert!(tools.seen().await.is_empty());
}

#[tokio::test]
async fn trace_failure_does_not_abort_the_run() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let tools = Arc::new(ScriptedDispatcher::new());
    let p = pipeline(model, tools).with_trace(Arc::new(BrokenTrace));

    let outcome = p.run().await.unwrap();
    assert_eq!(outcome.transcript.len(), 5);
}

#[tokio::test]
async fn non_assistant_response_is_rejected() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(Message::user("I am the model"))]));
    let tools = Arc::new(ScriptedDispatcher::new());
    let err = pipeline(model, tools).run().await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidResponse { .. }));
}

#[tokio::test]
async fn duplicate_tool_call_ids_are_rejected() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(calls(&["1", "1"]))]));
    let tools = Arc::new(ScriptedDispatcher::new());
    let err = pipeline(model, tools.clone()).run().await.unwrap_err();
    match err {
        PipelineError::InvalidResponse { reason } => assert!(reason.contains("duplicate")),
        other => panic!("expected InvalidResponse, got {other:?}"),
    }
    assert!(tools.seen().await.is_empty());
}

#[tokio::test]
async fn small_window_still_sends_valid_payloads() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(calls(&["1", "2", "3"])),
        Ok(Message::assistant("requirements")),
    ]));
    let tools = Arc::new(ScriptedDispatcher::new());
    let p = pipeline(model.clone(), tools)
        .with_config(PipelineConfig::default().with_window_size(2));

    p.run().await.unwrap();

    // Window of 2 lands on tool "2"; it is pulled back to the request.
    let reinvoked = &model.payloads().await[1];
    assert_eq!(reinvoked.len(), 5);
    assert!(reinvoked[1].has_tool_calls());
}
