//! Archive sources, decoding and delivery for the eddn-replay tool.
//!
//! This crate provides the replay pipeline:
//!
//! - [`url::ArchiveRoot`] - Builds daily archive URLs
//! - [`ArchiveClient`] - Streams archive bodies over HTTP
//! - [`bz2_lines`] - bzip2 decoding split into bounded lines
//! - [`HttpSink`] - Posts each record to the collector
//! - [`forward_stream`] - Decompress-and-forward for one archive stream
//! - [`Replayer`] - Sequential replay over remote days or local files

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod decompress;
mod lines;
mod pipeline;
mod sink;
mod source;
pub mod url;

pub use client::{ArchiveBody, ArchiveClient, ClientConfig, FetchError};
pub use decompress::bz2_lines;
pub use lines::{BoundedLines, DEFAULT_MAX_LINE_BYTES, LineError};
pub use pipeline::{PipelineOptions, StreamOutcome, forward_stream};
pub use sink::{BoxError, Delivery, DeliveryError, HttpSink, Sink};
pub use source::{ReplayOptions, Replayer, RunSummary, list_archives};
