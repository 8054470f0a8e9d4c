//! Per-pipeline atomic counters.
//!
//! Counters are bumped silently during a run. [`PipelineMetrics::flush`]
//! emits the current values as one `info!` event at the end of each run.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    model_calls: AtomicU64,
    tool_calls: AtomicU64,
    tool_errors: AtomicU64,
    transitions: AtomicU64,
    degraded_payloads: AtomicU64,
}

impl PipelineMetrics {
    pub const fn new() -> Self {
        Self {
            model_calls: AtomicU64::new(0),
            tool_calls: AtomicU64::new(0),
            tool_errors: AtomicU64::new(0),
            transitions: AtomicU64::new(0),
            degraded_payloads: AtomicU64::new(0),
        }
    }

    pub fn inc_model_calls(&self) {
        self.model_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one dispatched tool call, and one tool error if it failed.
    pub fn record_tool_call(&self, is_error: bool) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.tool_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_transitions(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_degraded_payloads(&self) {
        self.degraded_payloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            model_calls = self.model_calls(),
            tool_calls = self.tool_calls(),
            tool_errors = self.tool_errors(),
            transitions = self.transitions(),
            degraded_payloads = self.degraded_payloads(),
        );
    }

    pub fn model_calls(&self) -> u64 {
        self.model_calls.load(Ordering::Relaxed)
    }

    pub fn tool_calls(&self) -> u64 {
        self.tool_calls.load(Ordering::Relaxed)
    }

    pub fn tool_errors(&self) -> u64 {
        self.tool_errors.load(Ordering::Relaxed)
    }

    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Relaxed)
    }

    pub fn degraded_payloads(&self) -> u64 {
        self.degraded_payloads.load(Ordering::Relaxed)
    }
}
