//! Best-effort audit sinks for transcript appends.
//!
//! One line per append: `[HH:MM:SS] label: content`. Tool-call requests carried
//! by an assistant message are listed after the content. The driver never
//! aborts a run because a sink failed; it logs the failure and moves on.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

use crate::domain::Message;

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("trace sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace sink lock poisoned")]
    Poisoned,
}

/// Write-only sink receiving every transcript append.
pub trait TraceLogger: Send + Sync {
    fn append(
        &self,
        timestamp: DateTime<Local>,
        label: &str,
        message: &Message,
    ) -> Result<(), TraceError>;
}

/// Render one trace line (without the trailing newline).
pub fn format_line(timestamp: DateTime<Local>, label: &str, message: &Message) -> String {
    let mut line = format!(
        "[{}] {}: {}",
        timestamp.format("%H:%M:%S"),
        label,
        message.content()
    );
    if !message.tool_calls().is_empty() {
        let calls: Vec<String> = message
            .tool_calls()
            .iter()
            .map(|c| format!("{}#{}", c.name, c.id))
            .collect();
        line.push_str(&format!(" [tool calls: {}]", calls.join(", ")));
    }
    line
}

/// Appends trace lines to a file, creating it (and its parent directory) if needed.
#[derive(Debug)]
pub struct FileTraceLogger {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileTraceLogger {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TraceLogger for FileTraceLogger {
    fn append(
        &self,
        timestamp: DateTime<Local>,
        label: &str,
        message: &Message,
    ) -> Result<(), TraceError> {
        let line = format_line(timestamp, label, message);
        let mut file = self.file.lock().map_err(|_| TraceError::Poisoned)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

/// Keeps trace lines in memory.
#[derive(Debug, Default)]
pub struct MemoryTraceLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryTraceLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl TraceLogger for MemoryTraceLogger {
    fn append(
        &self,
        timestamp: DateTime<Local>,
        label: &str,
        message: &Message,
    ) -> Result<(), TraceError> {
        self.lines
            .lock()
            .map_err(|_| TraceError::Poisoned)?
            .push(format_line(timestamp, label, message));
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTraceLogger;

impl TraceLogger for NullTraceLogger {
    fn append(&self, _: DateTime<Local>, _: &str, _: &Message) -> Result<(), TraceError> {
        Ok(())
    }
}

/// Forwards every line to two sinks. Both are attempted; the first failure is returned.
pub struct TeeTraceLogger<A, B> {
    first: A,
    second: B,
}

impl<A: TraceLogger, B: TraceLogger> TeeTraceLogger<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: TraceLogger, B: TraceLogger> TraceLogger for TeeTraceLogger<A, B> {
    fn append(
        &self,
        timestamp: DateTime<Local>,
        label: &str,
        message: &Message,
    ) -> Result<(), TraceError> {
        let first = self.first.append(timestamp, label, message);
        let second = self.second.append(timestamp, label, message);
        first.and(second)
    }
}
