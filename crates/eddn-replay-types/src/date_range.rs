//! Day range and day iteration.

use chrono::NaiveDate;
use std::iter::FusedIterator;

use crate::DateRangeError;

/// An inclusive range of calendar days to replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    /// Start date (inclusive).
    pub start: NaiveDate,
    /// End date (inclusive).
    pub end: NaiveDate,
}

impl DayRange {
    /// Creates a new day range, validating that start <= end.
    ///
    /// # Errors
    ///
    /// Returns an error if start > end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a day range covering a single day.
    #[must_use]
    pub const fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Returns an iterator over every day in the range, in ascending order.
    #[must_use]
    pub fn days(&self) -> DayIterator {
        days(self.start, self.end)
    }

    /// Returns the total number of days in the range.
    #[must_use]
    pub fn total_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    /// Returns true if the range contains the given date.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl std::fmt::Display for DayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Returns a lazy iterator over the days from `start` to `end`, inclusive.
///
/// Unlike [`DayRange::new`], this does not reject inverted bounds: when
/// `start > end` the iterator is simply empty.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use eddn_replay_types::days;
///
/// let start = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
/// let end = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
/// let all: Vec<_> = days(start, end).map(|d| d.to_string()).collect();
/// assert_eq!(all, ["2025-01-30", "2025-01-31", "2025-02-01"]);
/// ```
#[must_use]
pub const fn days(start: NaiveDate, end: NaiveDate) -> DayIterator {
    DayIterator {
        current: Some(start),
        end,
    }
}

/// Iterator over the days of an inclusive range.
///
/// Each call to [`days`] or [`DayRange::days`] creates an independent
/// iterator; dropping it early stops iteration.
#[derive(Debug, Clone)]
pub struct DayIterator {
    current: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DayIterator {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let day = self.current.filter(|day| *day <= self.end)?;
        // None once we step past NaiveDate::MAX
        self.current = day.succ_opt();
        Some(day)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.current {
            Some(day) if day <= self.end => (self.end - day).num_days() as usize + 1,
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DayIterator {}

impl FusedIterator for DayIterator {}
