//! eddn-replay CLI - Replays EDDN JSONL archives into an HTTP collector.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

mod config;
mod logging;
mod replay;

use config::Settings;
use eddn_replay_lib::ProgressScope;

#[derive(Parser, Debug)]
#[command(name = "eddn-replay")]
#[command(about = "Replay bzip2-compressed EDDN JSONL archives into an HTTP collector", long_about = None)]
#[command(version)]
struct Cli {
    /// Collector endpoint receiving one POST per record
    #[arg(long, env = "WORKER_URL")]
    worker_url: String,

    /// Download daily archives (true) or read a local folder (false)
    #[arg(
        long,
        env = "DOWNLOAD",
        default_value = "true",
        action = clap::ArgAction::Set,
        value_parser = config::parse_download_flag
    )]
    download: bool,

    /// Archive root URL, daily files live under <root>/<YYYY-MM>/
    #[arg(long, env = "DOWNLOAD_URL")]
    download_url: Option<String>,

    /// First day to download (YYYY-MM-DD)
    #[arg(short, long, env = "DOWNLOAD_START_DATE")]
    start: Option<String>,

    /// Last day to download, inclusive (YYYY-MM-DD)
    #[arg(short, long, env = "DOWNLOAD_END_DATE")]
    end: Option<String>,

    /// Folder of .jsonl.bz2 archives, replayed in file name order
    #[arg(long, env = "ARCHIVE_FOLDER")]
    archive_folder: Option<PathBuf>,

    /// Longest record accepted, in bytes. Longer lines are skipped.
    #[arg(long, default_value_t = eddn_replay_lib::DEFAULT_MAX_LINE_BYTES)]
    max_line_bytes: usize,

    /// Deadline for each delivery request, in seconds
    #[arg(long, default_value = "30")]
    delivery_timeout: u64,

    /// Maximum idle time while reading an archive download, in seconds
    #[arg(long, default_value = "60")]
    fetch_timeout: u64,

    /// Reset progress counters per archive (stream) or keep them for the run
    #[arg(long, default_value = "stream")]
    progress_scope: ProgressScope,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let settings = Settings::from_cli(&cli)?;

    let cancel = CancellationToken::new();
    tokio::spawn(replay::cancel_on_interrupt(cancel.clone()));

    let summary = replay::run(settings, cancel).await?;
    replay::log_summary(&summary);

    Ok(())
}
