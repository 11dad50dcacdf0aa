// ─── Progress Reporting ───
// Structured progress events flow through a bounded channel consumed by
// exactly one reader (the presentation layer). Workers never share a
// mutable log target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

/// Tag identifying where a console line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogSource {
    /// Messages produced by the acquisition core itself.
    Launcher,
    /// Pass-through output of the spawned game process.
    Game,
}

impl std::fmt::Display for LogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogSource::Launcher => write!(f, "LAUNCHER"),
            LogSource::Game => write!(f, "GAME"),
        }
    }
}

/// One console line, timestamped at emission.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub message: String,
    pub source: LogSource,
    pub at: DateTime<Utc>,
}

/// Sink accepted by every component that reports progress.
///
/// Implementations must not block the caller appreciably; the channel-backed
/// implementation drops events when the consumer falls behind.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, message: &str, source: LogSource);
}

/// Channel-backed sink handed to workers; clone freely.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

/// Create the bounded progress channel. The receiver belongs to the single
/// presentation-layer reader task.
pub fn progress_channel(capacity: usize) -> (ChannelSink, mpsc::Receiver<ProgressEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelSink { tx }, rx)
}

impl ProgressSink for ChannelSink {
    fn emit(&self, message: &str, source: LogSource) {
        let event = ProgressEvent {
            message: message.to_string(),
            source,
            at: Utc::now(),
        };
        if self.tx.try_send(event).is_err() {
            // Reader is gone or lagging; progress is advisory, never worth
            // stalling a download worker for.
            debug!("Dropped progress event: {}", message);
        }
    }
}

/// Sink that discards everything. Useful for headless callers and tests
/// that assert on results rather than messages.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _message: &str, _source: LogSource) {}
}

/// Yes/no confirmation prompt shown by the presentation layer.
/// Invoked exactly once per manual-placement protocol run.
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, title: &str, body: &str) -> bool;
}
