//! Log sink port for lines drained from child processes.
//!
//! Drain tasks push every decoded line here instead of emitting events,
//! so CLI output, test capture and structured storage are all just sinks.

/// Which output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Port for appending drained log lines.
///
/// Implementations should be cheap and non-blocking; they run inside the
/// drain loop.
pub trait LogSink: Send + Sync {
    /// Append one line (without trailing newline) from `source`.
    fn append(&self, source: &str, stream: StreamKind, line: &str);
}

/// A sink that discards all lines.
///
/// Lines are still logged through `tracing` by the drain tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    fn append(&self, _source: &str, _stream: StreamKind, _line: &str) {}
}
