use reqlog_core::SinkConfig;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Destination for rendered request log lines.
pub trait LogSink: Send + Sync {
    /// Write one line (without trailing newline).
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Emits each line as a `tracing` info event with target `reqlog`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        tracing::info!(target: "reqlog", "{}", line);
        Ok(())
    }
}

/// Writes lines to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Remove and return every line written so far.
    pub fn drain(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|mut l| std::mem::take(&mut *l))
            .unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?;
        lines.push(line.to_string());
        Ok(())
    }
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn write_line(&self, line: &str) -> io::Result<()> {
        (**self).write_line(line)
    }
}

/// Build the sink described by `config`.
pub fn from_config(config: &SinkConfig) -> Arc<dyn LogSink> {
    match config {
        SinkConfig::Tracing => Arc::new(TracingSink),
        SinkConfig::Stdout => Arc::new(StdoutSink),
    }
}
