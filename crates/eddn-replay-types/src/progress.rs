//! Throughput counters for record forwarding.
//!
//! A [`Progress`] is owned by whoever drives the pipeline and passed into
//! each stream by `&mut`. Whether it is reset between archive streams or
//! carried across the whole run is the caller's choice, expressed with
//! [`ProgressScope`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// How long a [`Progress`] lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProgressScope {
    /// Reset before every archive stream.
    #[default]
    Stream,
    /// Shared by every stream of the run.
    Run,
}

impl ProgressScope {
    /// Returns the scope as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::Run => "run",
        }
    }
}

impl std::fmt::Display for ProgressScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProgressScope {
    type Err = ProgressScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stream" | "file" | "day" => Ok(Self::Stream),
            "run" | "global" => Ok(Self::Run),
            _ => Err(ProgressScopeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid progress scope string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressScopeParseError(String);

impl std::fmt::Display for ProgressScopeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid progress scope '{}', expected one of: stream, run",
            self.0
        )
    }
}

impl std::error::Error for ProgressScopeParseError {}

/// Point-in-time view of the counters, taken after each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Records counted so far.
    pub count: u64,
    /// Wall-clock time since [`Progress::begin`].
    pub elapsed: Duration,
    /// `elapsed / count`.
    pub average: Duration,
}

/// Cumulative record counters with a running mean duration per record.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    started: Option<Instant>,
    count: u64,
    delivery_failures: u64,
    parse_failures: u64,
    skipped_lines: u64,
}

impl Progress {
    /// Creates an idle tracker. The clock starts on the first [`begin`](Self::begin).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            started: None,
            count: 0,
            delivery_failures: 0,
            parse_failures: 0,
            skipped_lines: 0,
        }
    }

    /// Starts the clock if it is not already running.
    pub fn begin(&mut self) {
        self.begin_at(Instant::now());
    }

    fn begin_at(&mut self, now: Instant) {
        if self.started.is_none() {
            self.started = Some(now);
        }
    }

    /// Clears all counters and stops the clock.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Counts one record and returns the updated snapshot.
    pub fn record(&mut self) -> ProgressSnapshot {
        self.record_at(Instant::now())
    }

    fn record_at(&mut self, now: Instant) -> ProgressSnapshot {
        self.begin_at(now);
        self.count += 1;
        let elapsed = self
            .started
            .map_or(Duration::ZERO, |started| now.saturating_duration_since(started));
        ProgressSnapshot {
            count: self.count,
            elapsed,
            average: average(elapsed, self.count),
        }
    }

    /// Counts a record whose delivery failed in transport.
    pub const fn record_delivery_failure(&mut self) {
        self.delivery_failures += 1;
    }

    /// Counts a record whose header could not be decoded.
    pub const fn record_parse_failure(&mut self) {
        self.parse_failures += 1;
    }

    /// Counts a line that was dropped before delivery.
    pub const fn record_skipped_line(&mut self) {
        self.skipped_lines += 1;
    }

    /// Records counted so far.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Transport failures so far.
    #[must_use]
    pub const fn delivery_failures(&self) -> u64 {
        self.delivery_failures
    }

    /// Header decode failures so far.
    #[must_use]
    pub const fn parse_failures(&self) -> u64 {
        self.parse_failures
    }

    /// Lines dropped before delivery so far.
    #[must_use]
    pub const fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// Time since the clock started, zero if it has not.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.map_or(Duration::ZERO, |started| started.elapsed())
    }

    /// Current running mean per record, zero before the first record.
    #[must_use]
    pub fn average(&self) -> Duration {
        average(self.elapsed(), self.count)
    }
}

fn average(elapsed: Duration, count: u64) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    let nanos = elapsed.as_nanos() / u128::from(count);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
