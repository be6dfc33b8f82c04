use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// Status updates pushed while a research run moves through its stages.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Planning,
    Searching { pass: u8, queries: usize },
    SearchFailures { pass: u8, failed: usize },
    Tightening,
    Writing,
    /// Always immediately precedes `Brief`.
    Written,
    Brief(String),
    NoSources { tightened: bool },
    Failed(String),
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Brief(_) | ProgressEvent::NoSources { .. } | ProgressEvent::Failed(_)
        )
    }

    /// Server-sent event name for this update.
    pub fn event_name(&self) -> &'static str {
        match self {
            ProgressEvent::Brief(_) => "brief",
            ProgressEvent::NoSources { .. } => "no_sources",
            ProgressEvent::Failed(_) => "error",
            _ => "progress",
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Planning => write!(f, "🔎 Planning searches…"),
            ProgressEvent::Searching { queries, .. } => {
                write!(f, "🌐 Searching the web ({queries} queries)…")
            }
            ProgressEvent::SearchFailures { pass, failed } => {
                let noun = if *failed == 1 { "query" } else { "queries" };
                if *pass > 1 {
                    write!(f, "ℹ️ {failed} {noun} failed in tighten pass.")
                } else {
                    write!(f, "ℹ️ {failed} {noun} failed; continuing with the rest.")
                }
            }
            ProgressEvent::Tightening => write!(f, "🔧 Tightening queries for better evidence…"),
            ProgressEvent::Writing => write!(f, "🧠 Writing brief…"),
            ProgressEvent::Written => write!(f, "✅ Done. See sources below."),
            ProgressEvent::Brief(markdown) => write!(f, "{markdown}"),
            ProgressEvent::NoSources { tightened: false } => {
                write!(f, "⚠️ No recent credible sources found. Try a narrower query.")
            }
            ProgressEvent::NoSources { tightened: true } => {
                write!(f, "⚠️ Still not enough recent credible sources after tightening.")
            }
            ProgressEvent::Failed(message) => write!(f, "❌ Error: {message}"),
        }
    }
}

/// Ordered progress of one run. Dropping it aborts the run.
pub struct ProgressStream {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
    task: JoinHandle<()>,
}

impl ProgressStream {
    pub fn new(rx: mpsc::UnboundedReceiver<ProgressEvent>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ProgressStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}
