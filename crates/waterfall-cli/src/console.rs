//! Terminal collaborators: the transcript printer and the stdin problem source.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use waterfall_core::trace::format_line;
use waterfall_core::{Message, ProblemSource, TraceError, TraceLogger};

pub const PROMPT: &str = "Describe the problem: ";

/// Prints every transcript append, one line each.
pub struct ConsoleTraceLogger<W> {
    out: Mutex<W>,
}

impl ConsoleTraceLogger<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleTraceLogger<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> TraceLogger for ConsoleTraceLogger<W> {
    fn append(
        &self,
        timestamp: DateTime<Local>,
        label: &str,
        message: &Message,
    ) -> Result<(), TraceError> {
        let line = format_line(timestamp, label, message);
        let mut out = self.out.lock().map_err(|_| TraceError::Poisoned)?;
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

/// Reads the problem statement as one line of input.
pub struct LineProblem<R> {
    input: tokio::sync::Mutex<R>,
    prompt: bool,
}

impl LineProblem<BufReader<Stdin>> {
    /// Prompt on stderr and read from stdin.
    pub fn stdin() -> Self {
        Self {
            input: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin())),
            prompt: true,
        }
    }
}

impl<R: AsyncBufRead + Unpin + Send> LineProblem<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: tokio::sync::Mutex::new(input),
            prompt: false,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> ProblemSource for LineProblem<R> {
    async fn collect_problem(&self) -> Result<String, String> {
        if self.prompt {
            eprint!("{PROMPT}");
        }
        let mut line = String::new();
        let mut input = self.input.lock().await;
        input
            .read_line(&mut line)
            .await
            .map_err(|e| format!("failed to read problem statement: {e}"))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
