//! Error types for eddn-replay.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for eddn-replay operations.
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Errors that abort a whole replay run.
///
/// Failures scoped to a single archive or a single record are logged and
/// skipped by the pipeline and never surface as a `ReplayError`.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Invalid archive root or archive URL.
    #[error("URL error: {0}")]
    Url(String),

    /// Invalid date range.
    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    /// The local archive directory could not be listed.
    #[error("Cannot read archive directory {}: {source}", .path.display())]
    ArchiveDir {
        /// The directory that was listed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Error for invalid date ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// Start date is after end date.
    #[error("Invalid date range: {start} > {end}")]
    InvalidRange {
        /// The start date.
        start: NaiveDate,
        /// The end date.
        end: NaiveDate,
    },
}
