//! Archive sources and the sequential replay loop.
//!
//! Two mutually exclusive sources feed the pipeline: a remote archive walked
//! one day at a time, or a local directory walked in file name order. Either
//! way streams are processed one after another, never concurrently.

use eddn_replay_types::{DayRange, Progress, ProgressScope, ReplayError};
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ArchiveClient, FetchError};
use crate::pipeline::{PipelineOptions, StreamOutcome, forward_stream};
use crate::sink::Sink;
use crate::url::ArchiveRoot;

/// Options shared by both sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Per-stream pipeline options.
    pub pipeline: PipelineOptions,
    /// Whether progress restarts with every stream or spans the run.
    pub scope: ProgressScope,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Streams opened and handed to the pipeline.
    pub streams: u64,
    /// Streams that could not be opened.
    pub streams_skipped: u64,
    /// Streams that ended on a decode error.
    pub streams_truncated: u64,
    /// Lines whose delivery attempt completed.
    pub lines: u64,
    /// Lines accepted by the sink.
    pub delivered: u64,
    /// Lines whose delivery failed.
    pub delivery_failures: u64,
    /// Oversized lines dropped.
    pub skipped_lines: u64,
    /// True if the run stopped on cancellation.
    pub cancelled: bool,
}

impl RunSummary {
    fn absorb(&mut self, outcome: &StreamOutcome) {
        self.streams += 1;
        self.streams_truncated += u64::from(outcome.decode_error.is_some());
        self.lines += outcome.lines;
        self.delivered += outcome.delivered;
        self.delivery_failures += outcome.delivery_failures;
        self.skipped_lines += outcome.skipped_lines;
        self.cancelled |= outcome.cancelled;
    }
}

/// Drives archive streams through the pipeline into one sink.
#[derive(Debug)]
pub struct Replayer<S> {
    sink: S,
    options: ReplayOptions,
    cancel: CancellationToken,
    progress: Progress,
}

impl<S: Sink> Replayer<S> {
    /// Creates a replayer delivering to `sink`.
    #[must_use]
    pub fn new(sink: S, options: ReplayOptions) -> Self {
        Self {
            sink,
            options,
            cancel: CancellationToken::new(),
            progress: Progress::new(),
        }
    }

    /// Uses `cancel` as the run-level cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the progress counters.
    #[must_use]
    pub const fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Replays one archive per day of `range` from a remote root.
    ///
    /// A day whose archive cannot be fetched is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if an archive URL cannot be built from `root`.
    pub async fn run_remote(
        &mut self,
        client: &ArchiveClient,
        root: &ArchiveRoot,
        range: DayRange,
    ) -> Result<RunSummary, ReplayError> {
        let mut summary = RunSummary::default();
        info!(range = %range, days = range.total_days(), "Starting remote replay");

        for day in range.days() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let url = root
                .day_url(day)
                .map_err(|e| ReplayError::Url(e.to_string()))?;
            info!("Download from {url}...");

            let body = match client.fetch(url.clone()).await {
                Ok(body) => body,
                Err(FetchError::NotFound) => {
                    warn!(%day, %url, "No archive published for day, skipping");
                    summary.streams_skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(%day, %url, error = %e, "Error getting from archive URL, skipping");
                    summary.streams_skipped += 1;
                    continue;
                }
            };

            let outcome = self.forward(body).await;
            log_outcome(url.as_str(), &outcome);
            summary.absorb(&outcome);
        }

        Ok(summary)
    }

    /// Replays every file in `dir`, in ascending file name order.
    ///
    /// Daily archive names embed the date, so name order is chronological.
    /// A file that cannot be opened is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub async fn run_local(&mut self, dir: &Path) -> Result<RunSummary, ReplayError> {
        let files = list_archives(dir).await?;
        let mut summary = RunSummary::default();
        info!(dir = %dir.display(), files = files.len(), "Starting local replay");

        for path in files {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let file = match tokio::fs::File::open(&path).await {
                Ok(file) => file,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to open file, skipping");
                    summary.streams_skipped += 1;
                    continue;
                }
            };
            info!("Processing {}...", path.display());

            let outcome = self.forward(file).await;
            log_outcome(&path.display().to_string(), &outcome);
            summary.absorb(&outcome);
        }

        Ok(summary)
    }

    async fn forward<R>(&mut self, reader: R) -> StreamOutcome
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        if self.options.scope == ProgressScope::Stream {
            self.progress.reset();
        }
        forward_stream(
            reader,
            &self.sink,
            &mut self.progress,
            &self.options.pipeline,
            &self.cancel,
        )
        .await
    }
}

/// Lists the regular files of `dir`, sorted by file name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub async fn list_archives(dir: &Path) -> Result<Vec<PathBuf>, ReplayError> {
    let dir_error = |source| ReplayError::ArchiveDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(dir_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
        let is_dir = entry
            .file_type()
            .await
            .is_ok_and(|file_type| file_type.is_dir());
        if is_dir {
            debug!(path = %entry.path().display(), "Skipping directory");
            continue;
        }
        files.push(entry.path());
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn log_outcome(source: &str, outcome: &StreamOutcome) {
    if outcome.is_clean() {
        info!(
            source,
            lines = outcome.lines,
            delivered = outcome.delivered,
            "Finished stream"
        );
    } else {
        warn!(
            source,
            lines = outcome.lines,
            delivered = outcome.delivered,
            delivery_failures = outcome.delivery_failures,
            skipped_lines = outcome.skipped_lines,
            truncated = outcome.decode_error.is_some(),
            cancelled = outcome.cancelled,
            "Finished stream with errors"
        );
    }
}
