//! Replay bzip2-compressed EDDN JSONL archives into an HTTP collector.
//!
//! This is a facade crate that re-exports functionality from the
//! eddn-replay workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use eddn_replay_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ArchiveClient::with_defaults()?;
//!     let root = ArchiveRoot::parse("https://archive.example.org/eddn")?;
//!     let sink = HttpSink::new(
//!         "http://localhost:8787/".parse()?,
//!         client.config(),
//!     )?;
//!
//!     let range = DayRange::new(
//!         chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
//!         chrono::NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
//!     )?;
//!
//!     let mut replayer = Replayer::new(sink, ReplayOptions::default());
//!     let summary = replayer.run_remote(&client, &root, range).await?;
//!     println!("Delivered {} records", summary.delivered);
//!
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use eddn_replay_types::*;

// Re-export sources, pipeline and delivery
#[cfg(feature = "fetch")]
pub use eddn_replay_fetch::{
    ArchiveBody, ArchiveClient, BoundedLines, BoxError, ClientConfig, DEFAULT_MAX_LINE_BYTES,
    Delivery, DeliveryError, FetchError, HttpSink, LineError, PipelineOptions, ReplayOptions,
    Replayer, RunSummary, Sink, StreamOutcome, bz2_lines, forward_stream, list_archives, url,
};

/// Prelude module for convenient imports.
///
/// ```
/// use eddn_replay_lib::prelude::*;
/// ```
pub mod prelude {
    pub use eddn_replay_types::{
        DateRangeError, DayRange, Progress, ProgressScope, Record, ReplayError, Result, days,
    };

    #[cfg(feature = "fetch")]
    pub use eddn_replay_fetch::{
        ArchiveClient, ClientConfig, HttpSink, PipelineOptions, ReplayOptions, Replayer,
        RunSummary, Sink, url::ArchiveRoot,
    };
}
