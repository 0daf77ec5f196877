//! Runs a replay from validated settings.

use anyhow::{Context, Result};
use eddn_replay_lib::{ArchiveClient, HttpSink, Replayer, RunSummary};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Settings, Source};

/// Replays the configured source into the worker URL.
pub(crate) async fn run(settings: Settings, cancel: CancellationToken) -> Result<RunSummary> {
    let Settings {
        worker_url,
        source,
        client,
        options,
    } = settings;

    let sink = HttpSink::new(worker_url.clone(), &client)
        .context("Failed to create delivery client")?;
    info!(worker = %worker_url, scope = %options.scope, "Delivering records");

    let mut replayer = Replayer::new(sink, options).with_cancellation(cancel);

    let summary = match source {
        Source::Remote { root, range } => {
            let client = ArchiveClient::new(client).context("Failed to create download client")?;
            replayer.run_remote(&client, &root, range).await?
        }
        Source::Local { dir } => replayer.run_local(&dir).await?,
    };

    Ok(summary)
}

/// Cancels `cancel` on Ctrl-C.
pub(crate) async fn cancel_on_interrupt(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Interrupt received, stopping after the current record");
            cancel.cancel();
        }
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
    }
}

/// Logs the end-of-run totals.
pub(crate) fn log_summary(summary: &RunSummary) {
    info!(
        streams = summary.streams,
        streams_skipped = summary.streams_skipped,
        streams_truncated = summary.streams_truncated,
        lines = summary.lines,
        delivered = summary.delivered,
        delivery_failures = summary.delivery_failures,
        skipped_lines = summary.skipped_lines,
        cancelled = summary.cancelled,
        "Replay finished"
    );
}
