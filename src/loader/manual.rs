// ─── Manual Installer Placement ───
// Last-resort acquisition path: ask the user once, then watch a
// directory until a matching jar appears or the deadline passes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::info;

use crate::error::{LauncherError, LauncherResult};
use crate::progress::{ConfirmPrompt, LogSource, ProgressSink};

/// Waits for a user to drop an installer jar into a directory. The
/// prompt fires exactly once, before any polling starts; a declined
/// prompt never touches the filesystem.
pub struct ManualPlacement {
    dir: PathBuf,
    fragment: String,
    poll_interval: Duration,
    status_interval: Duration,
    deadline: Duration,
}

impl ManualPlacement {
    pub fn new(dir: PathBuf, fragment: impl Into<String>) -> Self {
        Self {
            dir,
            fragment: fragment.into(),
            poll_interval: Duration::from_secs(1),
            status_interval: Duration::from_secs(5),
            deadline: Duration::from_secs(300),
        }
    }

    /// Override the polling cadence and deadline.
    pub fn with_intervals(mut self, poll: Duration, status: Duration, deadline: Duration) -> Self {
        self.poll_interval = poll;
        self.status_interval = status;
        self.deadline = deadline;
        self
    }

    /// Any `.jar` whose file name contains the fragment counts as a
    /// match; ties break on sorted name so repeated scans are stable.
    fn scan(&self) -> Option<PathBuf> {
        let entries = std::fs::read_dir(&self.dir).ok()?;
        let mut matches: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| Self::name_matches(p, &self.fragment))
            .collect();
        matches.sort();
        matches.into_iter().next()
    }

    fn name_matches(path: &Path, fragment: &str) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.ends_with(".jar") && name.contains(fragment)
    }

    pub async fn wait(
        &self,
        prompt: &dyn ConfirmPrompt,
        sink: &dyn ProgressSink,
    ) -> LauncherResult<PathBuf> {
        let body = format!(
            "Automatic download failed.\n\nPlace an installer jar matching \"{}\" into:\n{}\n\nContinue and wait for the file?",
            self.fragment,
            self.dir.display()
        );
        if !prompt.confirm("Manual installer placement", &body) {
            return Err(LauncherError::ManualCancelled);
        }

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| LauncherError::io(self.dir.clone(), e))?;
        sink.emit(
            &format!("Waiting for installer in {}", self.dir.display()),
            LogSource::Launcher,
        );

        let started = Instant::now();
        let mut last_status = started;
        loop {
            if let Some(found) = self.scan() {
                info!("Manually placed installer found: {}", found.display());
                sink.emit(
                    &format!("Found installer {}", found.display()),
                    LogSource::Launcher,
                );
                return Ok(found);
            }

            let elapsed = started.elapsed();
            if elapsed >= self.deadline {
                return Err(LauncherError::ManualTimeout {
                    dir: self.dir.clone(),
                    fragment: self.fragment.clone(),
                });
            }
            if last_status.elapsed() >= self.status_interval {
                let remaining = self.deadline.saturating_sub(elapsed);
                sink.emit(
                    &format!(
                        "Still waiting for installer ({}s remaining)",
                        remaining.as_secs()
                    ),
                    LogSource::Launcher,
                );
                last_status = Instant::now();
            }

            sleep(self.poll_interval).await;
        }
    }
}
