//! Resolves command line and environment input into a runnable configuration.
//!
//! Every fault here is fatal: the run does not start.

use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDate;
use eddn_replay_lib::url::{ArchiveRoot, Url};
use eddn_replay_lib::{ClientConfig, DayRange, PipelineOptions, ReplayOptions};
use std::path::PathBuf;
use std::time::Duration;

use crate::Cli;

/// Where archives come from.
#[derive(Debug)]
pub(crate) enum Source {
    /// One archive per day, downloaded from `root`.
    Remote { root: ArchiveRoot, range: DayRange },
    /// Every file of a local folder.
    Local { dir: PathBuf },
}

/// Validated settings for one run.
#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) worker_url: Url,
    pub(crate) source: Source,
    pub(crate) client: ClientConfig,
    pub(crate) options: ReplayOptions,
}

impl Settings {
    pub(crate) fn from_cli(cli: &Cli) -> Result<Self> {
        let worker_url = Url::parse(&cli.worker_url)
            .with_context(|| format!("Invalid worker URL: {}", cli.worker_url))?;

        ensure!(cli.max_line_bytes > 0, "--max-line-bytes must be positive");
        ensure!(cli.delivery_timeout > 0, "--delivery-timeout must be positive");
        ensure!(cli.fetch_timeout > 0, "--fetch-timeout must be positive");

        let source = if cli.download {
            remote_source(cli)?
        } else {
            let dir = cli
                .archive_folder
                .clone()
                .context("ARCHIVE_FOLDER (--archive-folder) is required when DOWNLOAD=false")?;
            Source::Local { dir }
        };

        let client = ClientConfig {
            fetch_read_timeout: Duration::from_secs(cli.fetch_timeout),
            delivery_timeout: Duration::from_secs(cli.delivery_timeout),
            ..Default::default()
        };

        let options = ReplayOptions {
            pipeline: PipelineOptions {
                max_line_bytes: cli.max_line_bytes,
            },
            scope: cli.progress_scope,
        };

        Ok(Self {
            worker_url,
            source,
            client,
            options,
        })
    }
}

fn remote_source(cli: &Cli) -> Result<Source> {
    let Some(root) = cli.download_url.as_deref() else {
        bail!("DOWNLOAD_URL (--download-url) is required when downloading");
    };
    let root = ArchiveRoot::parse(root)?;

    let start = parse_date(cli.start.as_deref(), "start", "DOWNLOAD_START_DATE")?;
    let end = parse_date(cli.end.as_deref(), "end", "DOWNLOAD_END_DATE")?;
    let range = DayRange::new(start, end)?;

    Ok(Source::Remote { root, range })
}

fn parse_date(value: Option<&str>, which: &str, env: &str) -> Result<NaiveDate> {
    let value = value.with_context(|| format!("{env} (--{which}) is required when downloading"))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid {which} date: {value}"))
}

/// Parses the `DOWNLOAD` switch. Only `false` selects the local folder.
pub(crate) fn parse_download_flag(value: &str) -> Result<bool, String> {
    Ok(!value.trim().eq_ignore_ascii_case("false"))
}
