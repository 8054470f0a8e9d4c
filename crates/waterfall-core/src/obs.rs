//! Structured lifecycle events for pipeline runs.
//!
//! - `run_span`: the `waterfall.run` span, tagged with `run_id`, that a run's
//!   future is instrumented with
//! - `emit_*`: one function per lifecycle event, so field names stay consistent
//!
//! Events go out at `info!`, except halts and degraded payloads which use `warn!`.

use tracing::{info, warn, Span};

pub fn run_span(run_id: &str) -> Span {
    tracing::info_span!("waterfall.run", run_id = %run_id)
}

pub fn emit_run_started(run_id: &str, step_budget: usize, window_size: usize) {
    info!(
        event = "run.started",
        run_id = %run_id,
        step_budget = step_budget,
        window_size = window_size,
    );
}

/// A role was invoked with a payload of `payload_len` messages.
pub fn emit_role_invoked(role: &str, payload_len: usize, tool_calls: usize) {
    info!(
        event = "role.invoked",
        role = %role,
        payload_len = payload_len,
        tool_calls = tool_calls,
    );
}

pub fn emit_tool_dispatched(tool: &str, call_id: &str, is_error: bool) {
    info!(
        event = "tool.dispatched",
        tool = %tool,
        call_id = %call_id,
        is_error = is_error,
    );
}

pub fn emit_stage_transition(from: &str, to: &str, transitions: usize) {
    info!(
        event = "stage.transition",
        from = %from,
        to = %to,
        transitions = transitions,
    );
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, transitions: usize, messages: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        transitions = transitions,
        messages = messages,
    );
}

/// Run stopped by the step budget.
pub fn emit_run_halted(run_id: &str, budget: usize) {
    warn!(event = "run.halted", run_id = %run_id, budget = budget);
}

pub fn emit_payload_degraded(role: &str, transcript_len: usize) {
    warn!(
        event = "payload.degraded",
        role = %role,
        transcript_len = transcript_len,
    );
}

/// Trace sink failed; the run continues.
pub fn emit_trace_failed(label: &str, error: &dyn std::fmt::Display) {
    warn!(event = "trace.failed", label = %label, error = %error);
}
