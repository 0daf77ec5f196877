//! Core types for the eddn-replay archive forwarder.
//!
//! This crate provides the fundamental data structures used throughout eddn-replay:
//!
//! - [`DayRange`] and [`days`] - Inclusive day ranges and their lazy iterator
//! - [`Record`] - The record header read for progress display
//! - [`Progress`] - Record counters with a running mean per record
//! - [`ReplayError`] - Errors that abort a run

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod date_range;
mod error;
mod progress;
mod record;

pub use date_range::{DayIterator, DayRange, days};
pub use error::{DateRangeError, ReplayError, Result};
pub use progress::{Progress, ProgressScope, ProgressScopeParseError, ProgressSnapshot};
pub use record::{Record, RecordHeader};
