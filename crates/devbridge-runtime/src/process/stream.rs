//! Async stream drain tasks (non-UTF8-safe).
//!
//! External tools can emit non-UTF8 bytes on stdout/stderr, and
//! `BufReader::lines()` would end the reader on the first invalid byte.
//! Lines are read as bytes and decoded lossily instead.
//!
//! Drain tasks are always owned: [`spawn_drain`] returns a `JoinHandle`
//! and stops when the stream hits EOF or the cancellation token fires.

use std::sync::Arc;

use devbridge_core::{LogSink, StreamKind};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Longest line forwarded in one piece; longer output is split into chunks.
pub const MAX_LINE_BYTES: u64 = 64 * 1024;

/// Flags a `watch` channel the first time a line satisfies `predicate`.
#[derive(Debug, Clone)]
pub struct LineWatch {
    pub predicate: fn(&str) -> bool,
    pub matched: watch::Sender<bool>,
}

impl LineWatch {
    pub fn new(predicate: fn(&str) -> bool) -> (Self, watch::Receiver<bool>) {
        let (matched, rx) = watch::channel(false);
        (Self { predicate, matched }, rx)
    }

    fn observe(&self, line: &str) {
        if !*self.matched.borrow() && (self.predicate)(line) {
            self.matched.send_replace(true);
        }
    }
}

/// How a drain task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    pub lines: usize,
    pub cancelled: bool,
}

/// Everything a drain task needs besides the stream itself.
#[derive(Clone)]
pub struct DrainContext {
    pub source: String,
    pub kind: StreamKind,
    pub sink: Arc<dyn LogSink>,
    pub watch: Option<LineWatch>,
    pub cancel: CancellationToken,
}

impl std::fmt::Debug for DrainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrainContext")
            .field("source", &self.source)
            .field("kind", &self.kind)
            .field("watch", &self.watch.is_some())
            .finish_non_exhaustive()
    }
}

/// Spawn a task that drains `stream` line by line into the context's sink.
pub fn spawn_drain<R>(stream: R, ctx: DrainContext) -> JoinHandle<DrainSummary>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(drain_lines(stream, ctx))
}

/// Drain `stream` until EOF, a read error, or cancellation.
pub async fn drain_lines<R>(stream: R, ctx: DrainContext) -> DrainSummary
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    let mut summary = DrainSummary {
        lines: 0,
        cancelled: false,
    };
    let source = ctx.source.as_str();
    let kind = ctx.kind;

    loop {
        buf.clear();
        let mut limited = (&mut reader).take(MAX_LINE_BYTES);
        let read = tokio::select! {
            () = ctx.cancel.cancelled() => {
                summary.cancelled = true;
                break;
            }
            read = limited.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => break,
            Ok(_) => {
                trim_line_ending(&mut buf);
                let line = String::from_utf8_lossy(&buf);
                debug!(%source, stream = %kind, "{}", line);
                ctx.sink.append(source, kind, &line);
                if let Some(watch) = &ctx.watch {
                    watch.observe(&line);
                }
                summary.lines += 1;
            }
            Err(e) => {
                debug!(%source, stream = %kind, error = %e, "drain exiting due to read error");
                break;
            }
        }
    }

    debug!(%source, stream = %kind, lines = summary.lines, cancelled = summary.cancelled, "drain task exiting");
    summary
}

fn trim_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<(String, StreamKind, String)>>);

    impl LogSink for CollectingSink {
        fn append(&self, source: &str, stream: StreamKind, line: &str) {
            self.0
                .lock()
                .unwrap()
                .push((source.to_string(), stream, line.to_string()));
        }
    }

    fn context(sink: Arc<CollectingSink>, watch: Option<LineWatch>) -> DrainContext {
        DrainContext {
            source: "test".to_string(),
            kind: StreamKind::Stdout,
            sink,
            watch,
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn drains_lines_with_lossy_decoding() {
        let sink = Arc::new(CollectingSink::default());
        let input: &[u8] = b"first\r\nsec\xffond\nlast-without-newline";
        let summary = drain_lines(input, context(sink.clone(), None)).await;

        assert_eq!(summary.lines, 3);
        assert!(!summary.cancelled);
        let lines = sink.0.lock().unwrap();
        assert_eq!(lines[0].2, "first");
        assert!(lines[1].2.starts_with("sec"));
        assert!(lines[1].2.ends_with("ond"));
        assert_eq!(lines[2].2, "last-without-newline");
    }

    #[tokio::test]
    async fn overlong_line_is_split_at_the_cap() {
        let sink = Arc::new(CollectingSink::default());
        let cap = usize::try_from(MAX_LINE_BYTES).unwrap();
        let mut input = vec![b'x'; cap + 10];
        input.extend_from_slice(b"\nnext\n");
        let summary = drain_lines(input.as_slice(), context(sink.clone(), None)).await;

        assert_eq!(summary.lines, 3);
        let lines = sink.0.lock().unwrap();
        assert_eq!(lines[0].2.len(), cap);
        assert_eq!(lines[1].2, "x".repeat(10));
        assert_eq!(lines[2].2, "next");
    }

    #[tokio::test]
    async fn watch_flips_on_matching_line() {
        let sink = Arc::new(CollectingSink::default());
        let (watch, rx) = LineWatch::new(|line| line.contains("ready"));
        let input: &[u8] = b"booting\nserver ready\nmore\n";
        drain_lines(input, context(sink, Some(watch))).await;
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn watch_stays_false_without_match() {
        let sink = Arc::new(CollectingSink::default());
        let (watch, rx) = LineWatch::new(|line| line.contains("ready"));
        let input: &[u8] = b"booting\nstill booting\n";
        drain_lines(input, context(sink, Some(watch))).await;
        assert!(!*rx.borrow());
    }

    #[tokio::test]
    async fn cancellation_ends_a_blocked_drain() {
        let sink = Arc::new(CollectingSink::default());
        let (_writer, reader) = tokio::io::duplex(64);
        let ctx = context(sink, None);
        let cancel = ctx.cancel.clone();

        let handle = spawn_drain(reader, ctx);
        cancel.cancel();
        let summary = handle.await.unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.lines, 0);
    }
}
