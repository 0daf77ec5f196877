//! Archive URL construction.

use chrono::NaiveDate;
pub use reqwest::Url;
use thiserror::Error;

/// File name prefix of a daily archive.
pub const ARCHIVE_FILE_PREFIX: &str = "Journal.FSDJump-";

/// File name suffix of a daily archive.
pub const ARCHIVE_FILE_SUFFIX: &str = ".jsonl.bz2";

/// Errors raised while building archive URLs.
///
/// These are configuration faults; a run cannot start with a bad root.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    /// The root is not a valid absolute URL.
    #[error("invalid archive root '{input}': {reason}")]
    Parse {
        /// The rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// The root does not use http or https.
    #[error("unsupported scheme '{scheme}' in archive root '{input}'")]
    UnsupportedScheme {
        /// The rejected input.
        input: String,
        /// The scheme found.
        scheme: String,
    },

    /// The root cannot take path segments.
    #[error("archive root '{0}' cannot be used as a base URL")]
    CannotBeABase(String),
}

/// Returns the archive file name for a day.
///
/// ```
/// use chrono::NaiveDate;
/// use eddn_replay_fetch::url::archive_file_name;
///
/// let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
/// assert_eq!(archive_file_name(day), "Journal.FSDJump-2025-01-02.jsonl.bz2");
/// ```
#[must_use]
pub fn archive_file_name(day: NaiveDate) -> String {
    format!(
        "{ARCHIVE_FILE_PREFIX}{}{ARCHIVE_FILE_SUFFIX}",
        day.format("%Y-%m-%d")
    )
}

/// A validated remote archive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRoot(Url);

impl ArchiveRoot {
    /// Parses and validates an archive root URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not an absolute `http` or `https` URL.
    pub fn parse(root: &str) -> Result<Self, UrlError> {
        let url = Url::parse(root).map_err(|e| UrlError::Parse {
            input: root.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(UrlError::UnsupportedScheme {
                input: root.to_string(),
                scheme: url.scheme().to_string(),
            });
        }
        if url.cannot_be_a_base() {
            return Err(UrlError::CannotBeABase(root.to_string()));
        }

        Ok(Self(url))
    }

    /// Returns the root URL.
    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }

    /// Builds the URL of one day's archive.
    ///
    /// URL format: `{root}/{YYYY-MM}/Journal.FSDJump-{YYYY-MM-DD}.jsonl.bz2`
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot take path segments.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use eddn_replay_fetch::url::ArchiveRoot;
    ///
    /// let root = ArchiveRoot::parse("https://archive.example/eddn/").unwrap();
    /// let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
    /// assert_eq!(
    ///     root.day_url(day).unwrap().as_str(),
    ///     "https://archive.example/eddn/2025-01/Journal.FSDJump-2025-01-02.jsonl.bz2"
    /// );
    /// ```
    pub fn day_url(&self, day: NaiveDate) -> Result<Url, UrlError> {
        let mut url = self.0.clone();
        url.path_segments_mut()
            .map_err(|()| UrlError::CannotBeABase(self.0.to_string()))?
            .pop_if_empty()
            .push(&day.format("%Y-%m").to_string())
            .push(&archive_file_name(day));
        Ok(url)
    }
}

impl std::fmt::Display for ArchiveRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
