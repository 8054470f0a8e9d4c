//! The single-task driver loop.
//!
//! [`Pipeline`] executes one stage at a time, awaiting each external call in
//! turn: the problem source at the client stage, the completion service at
//! each role stage, and the dispatcher once per request at the tools stage.
//! Nothing is spawned, so transcript order is the order of the awaits.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::context::build_payload;
use crate::domain::{Message, Role, ToolCallRequest, Transcript, TranscriptError};
use crate::metrics::PipelineMetrics;
use crate::obs;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::graph::RoleGraph;
use crate::pipeline::roles::{AgentRole, Stage};
use crate::pipeline::state::PipelineState;
use crate::services::{CompletionService, ProblemSource, ToolDispatcher};
use crate::tooling::ToolCatalog;
use crate::trace::{NullTraceLogger, TraceLogger};

/// Trace label for tool messages.
pub const TOOLS_LABEL: &str = "tools";

/// A run that reached [`Stage::Done`].
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_id: String,
    pub transcript: Transcript,
    pub transitions: usize,
}

pub struct Pipeline {
    graph: RoleGraph,
    config: PipelineConfig,
    model: Arc<dyn CompletionService>,
    tools: Arc<dyn ToolDispatcher>,
    problem: Arc<dyn ProblemSource>,
    trace: Arc<dyn TraceLogger>,
    catalog: ToolCatalog,
    metrics: PipelineMetrics,
}

impl Pipeline {
    /// Pipeline over the standard role graph with default configuration, an
    /// empty tool catalog and no trace sink.
    pub fn new(
        model: Arc<dyn CompletionService>,
        tools: Arc<dyn ToolDispatcher>,
        problem: Arc<dyn ProblemSource>,
    ) -> Self {
        Self {
            graph: RoleGraph::standard(),
            config: PipelineConfig::default(),
            model,
            tools,
            problem,
            trace: Arc::new(NullTraceLogger),
            catalog: ToolCatalog::new(),
            metrics: PipelineMetrics::new(),
        }
    }

    pub fn with_graph(mut self, graph: RoleGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_trace(mut self, trace: Arc<dyn TraceLogger>) -> Self {
        self.trace = trace;
        self
    }

    /// Tool definitions offered to the model on every role invocation.
    pub fn with_catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn graph(&self) -> &RoleGraph {
        &self.graph
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Run from the client stage to completion.
    ///
    /// Fails with [`PipelineError::RunawayHalt`] when the step budget runs out
    /// before the tester hands off to `done`.
    pub async fn run(&self) -> PipelineResult<RunOutcome> {
        self.config.validate()?;
        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id);
        async {
            let started = Instant::now();
            obs::emit_run_started(&run_id, self.config.step_budget, self.config.window_size);

            let mut state = PipelineState::new();
            let result = self.drive(&mut state).await;
            self.metrics.flush();

            match result {
                Ok(()) => {
                    obs::emit_run_finished(
                        &run_id,
                        started.elapsed().as_millis() as u64,
                        state.transitions,
                        state.transcript.len(),
                    );
                    Ok(RunOutcome {
                        run_id: run_id.clone(),
                        transcript: state.transcript,
                        transitions: state.transitions,
                    })
                }
                Err(e) => {
                    if e.is_runaway() {
                        obs::emit_run_halted(&run_id, self.config.step_budget);
                    }
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Follow transitions from `state.next_step` until `done` or the budget
    /// is spent.
    pub async fn drive(&self, state: &mut PipelineState) -> PipelineResult<()> {
        loop {
            if state.is_done() {
                return Ok(());
            }
            if state.transitions >= self.config.step_budget {
                return Err(PipelineError::RunawayHalt {
                    budget: self.config.step_budget,
                    transitions: state.transitions,
                });
            }

            let from = state.next_step;
            let next = self.step(state).await?;
            state.next_step = next;
            state.transitions += 1;
            self.metrics.inc_transitions();
            obs::emit_stage_transition(&from.to_string(), &next.to_string(), state.transitions);
        }
    }

    /// Execute the handler for `state.next_step` and return the stage that
    /// follows it. Does not move `state.next_step`.
    pub async fn step(&self, state: &mut PipelineState) -> PipelineResult<Stage> {
        match state.next_step {
            Stage::Role(AgentRole::Client) => self.seed(state).await,
            Stage::Role(role) => self.invoke_role(role, state).await,
            Stage::Tools => self.dispatch_tools(state).await,
            Stage::Done => Ok(Stage::Done),
        }
    }

    async fn seed(&self, state: &mut PipelineState) -> PipelineResult<Stage> {
        state.current_role = Some(AgentRole::Client);
        let problem = self
            .problem
            .collect_problem()
            .await
            .map_err(PipelineError::Input)?;
        if problem.trim().is_empty() {
            return Err(PipelineError::EmptyProblem);
        }

        let message = Message::user(problem);
        let next = self.graph.transition(AgentRole::Client, &message);
        self.record(state, AgentRole::Client.as_str(), message)?;
        Ok(next)
    }

    async fn invoke_role(&self, role: AgentRole, state: &mut PipelineState) -> PipelineResult<Stage> {
        state.current_role = Some(role);
        let spec = self.graph.spec(role);
        let payload = build_payload(
            spec.system_prompt(),
            state.transcript.as_slice(),
            self.config.window_size,
        );
        if payload.is_degraded() {
            self.metrics.inc_degraded_payloads();
            obs::emit_payload_degraded(role.as_str(), state.transcript.len());
        }

        let response = self.model.invoke(payload.messages(), &self.catalog).await?;
        self.metrics.inc_model_calls();
        if response.role() != Role::Assistant {
            return Err(PipelineError::InvalidResponse {
                reason: format!("expected an assistant message, got {}", response.role()),
            });
        }
        obs::emit_role_invoked(role.as_str(), payload.len(), response.tool_calls().len());

        let next = self.graph.transition(role, &response);
        self.record(state, role.as_str(), response)
            .map_err(|e| match e {
                PipelineError::Transcript(TranscriptError::DuplicateToolCallId { id }) => {
                    PipelineError::InvalidResponse {
                        reason: format!("duplicate tool-call id {id}"),
                    }
                }
                other => other,
            })?;
        Ok(next)
    }

    async fn dispatch_tools(&self, state: &mut PipelineState) -> PipelineResult<Stage> {
        let role = state
            .current_role
            .filter(|r| r.calls_model())
            .ok_or(PipelineError::NoPendingToolCalls)?;
        let pending: Vec<ToolCallRequest> = state.transcript.pending_tool_calls().to_vec();
        if pending.is_empty() {
            return Err(PipelineError::NoPendingToolCalls);
        }

        for request in &pending {
            let result = self.tools.execute(request).await;
            self.metrics.record_tool_call(result.is_error);
            obs::emit_tool_dispatched(&request.name, &request.id, result.is_error);
            self.record(
                state,
                TOOLS_LABEL,
                Message::tool_result(request.id.as_str(), result.content),
            )?;
        }
        Ok(Stage::Role(role))
    }

    /// Append to the transcript, then trace. Trace failures are logged only.
    fn record(&self, state: &mut PipelineState, label: &str, message: Message) -> PipelineResult<()> {
        state.transcript.append(message)?;
        if let Some(appended) = state.transcript.last() {
            if let Err(e) = self.trace.append(Local::now(), label, appended) {
                obs::emit_trace_failed(label, &e);
            }
        }
        Ok(())
    }
}
