// ─── Download Orchestrator ───
// Bounded-parallel batch downloads with fail-fast semantics. Every bulk
// transfer in the core funnels through here.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{LauncherError, LauncherResult};
use crate::progress::{LogSource, ProgressSink};

/// Default worker cap for a parallel batch.
pub const DEFAULT_CONCURRENCY: usize = 50;

/// A single file to fetch. Ephemeral: created per batch, discarded after.
///
/// Callers must guarantee destination disjointness within one batch;
/// colliding destinations across concurrent tasks is undefined behavior.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: String,
    pub dest: PathBuf,
    /// Human-readable name used in progress messages and failures.
    pub label: String,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            label: label.into(),
        }
    }
}

/// Concurrent batch downloader.
///
/// Policy: an existing destination file is proof of presence and short-
/// circuits the task without a fetch (no resume, no checksum). The first
/// failing task aborts the batch: tasks already in flight drain, no new
/// tasks start.
pub struct Downloader {
    client: Client,
    concurrency: usize,
    parallel: bool,
    sink: Arc<dyn ProgressSink>,
}

impl Downloader {
    pub fn new(client: Client, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
            parallel: true,
            sink,
        }
    }

    /// Maximum number of parallel downloads.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Disable parallelism entirely; the batch runs in submission order.
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    // ── Single file transfer ────────────────────────────

    /// Download one URL to `dest`, creating parent directories as needed.
    pub async fn download_file(&self, url: &str, dest: &Path) -> LauncherResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;

        // Write inside a block so the handle is dropped immediately,
        // critical on Windows.
        {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| LauncherError::Io {
                    path: dest.to_path_buf(),
                    source: e,
                })?;
            file.write_all(&bytes)
                .await
                .map_err(|e| LauncherError::Io {
                    path: dest.to_path_buf(),
                    source: e,
                })?;
            file.flush().await.map_err(|e| LauncherError::Io {
                path: dest.to_path_buf(),
                source: e,
            })?;
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }

    // ── Batch execution ─────────────────────────────────

    /// Execute a batch. Tasks whose destination already exists are skipped
    /// up front and emit no progress; everything else is fetched with at
    /// most `concurrency` transfers in flight.
    pub async fn run(&self, tasks: Vec<DownloadTask>) -> LauncherResult<()> {
        let (pending, skipped): (Vec<_>, Vec<_>) =
            tasks.into_iter().partition(|t| !t.dest.exists());

        if !skipped.is_empty() {
            debug!("{} destinations already present, skipped", skipped.len());
        }

        let total = pending.len();
        if total == 0 {
            return Ok(());
        }

        info!(
            "Starting batch download: {} files, concurrency={}",
            total,
            if self.parallel { self.concurrency } else { 1 }
        );

        if !self.parallel || total <= 1 {
            return self.run_sequential(pending, total).await;
        }

        self.run_parallel(pending, total).await
    }

    /// Sequential mode: deterministic log order, immediate abort.
    async fn run_sequential(&self, tasks: Vec<DownloadTask>, total: usize) -> LauncherResult<()> {
        for (index, task) in tasks.into_iter().enumerate() {
            match self.download_file(&task.url, &task.dest).await {
                Ok(()) => self.sink.emit(
                    &format!("Downloaded {} ({}/{})", task.label, index + 1, total),
                    LogSource::Launcher,
                ),
                Err(e) => {
                    self.sink.emit(
                        &format!("Failed to download {}: {e}", task.label),
                        LogSource::Launcher,
                    );
                    return Err(LauncherError::Task {
                        label: task.label,
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(())
    }

    /// Parallel mode: completion-order progress, fail-fast scheduling.
    async fn run_parallel(&self, tasks: Vec<DownloadTask>, total: usize) -> LauncherResult<()> {
        let aborted = AtomicBool::new(false);
        let completed = AtomicUsize::new(0);

        let mut results = stream::iter(tasks)
            .map(|task| {
                let aborted = &aborted;
                let completed = &completed;
                async move {
                    // A prior failure stops new work; this slot was queued
                    // but never started.
                    if aborted.load(Ordering::SeqCst) {
                        return Ok(());
                    }

                    match self.download_file(&task.url, &task.dest).await {
                        Ok(()) => {
                            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                            self.sink.emit(
                                &format!("Downloaded {} ({}/{})", task.label, done, total),
                                LogSource::Launcher,
                            );
                            Ok(())
                        }
                        Err(e) => Err((task.label, e)),
                    }
                }
            })
            .buffer_unordered(self.concurrency);

        let mut first_failure: Option<LauncherError> = None;
        while let Some(result) = results.next().await {
            if let Err((label, cause)) = result {
                aborted.store(true, Ordering::SeqCst);
                if first_failure.is_none() {
                    self.sink.emit(
                        &format!("Failed to download {label}: {cause}"),
                        LogSource::Launcher,
                    );
                    first_failure = Some(LauncherError::Task {
                        label,
                        source: Box::new(cause),
                    });
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
