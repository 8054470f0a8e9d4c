//! Pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::ConfigError;

pub const DEFAULT_STEP_BUDGET: usize = 60;
pub const DEFAULT_WINDOW_SIZE: usize = 40;
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;

pub const ENV_STEP_BUDGET: &str = "WATERFALL_STEP_BUDGET";
pub const ENV_WINDOW_SIZE: &str = "WATERFALL_WINDOW_SIZE";
pub const ENV_TOOL_TIMEOUT_MS: &str = "WATERFALL_TOOL_TIMEOUT_MS";
pub const ENV_TRACE_LOG: &str = "WATERFALL_TRACE_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum state transitions per run before it is halted.
    pub step_budget: usize,
    /// Messages of transcript shown to each role invocation.
    pub window_size: usize,
    pub tool_timeout_ms: u64,
    /// Trace file; `None` disables file tracing.
    pub trace_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            window_size: DEFAULT_WINDOW_SIZE,
            tool_timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
            trace_path: None,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `WATERFALL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_STEP_BUDGET)? {
            config.step_budget = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_WINDOW_SIZE)? {
            config.window_size = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_TOOL_TIMEOUT_MS)? {
            config.tool_timeout_ms = v;
        }
        if let Some(path) = lookup(ENV_TRACE_LOG).filter(|p| !p.trim().is_empty()) {
            config.trace_path = Some(PathBuf::from(path));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_step_budget(mut self, step_budget: usize) -> Self {
        self.step_budget = step_budget;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_tool_timeout_ms(mut self, tool_timeout_ms: u64) -> Self {
        self.tool_timeout_ms = tool_timeout_ms;
        self
    }

    pub fn with_trace_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_path = Some(path.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_budget == 0 {
            return Err(ConfigError::MustBePositive {
                field: "step_budget",
            });
        }
        if self.window_size == 0 {
            return Err(ConfigError::MustBePositive {
                field: "window_size",
            });
        }
        if self.tool_timeout_ms == 0 {
            return Err(ConfigError::MustBePositive {
                field: "tool_timeout_ms",
            });
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
    }
}
