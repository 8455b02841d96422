//! Date range and day iteration.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::DateRangeError;

/// Returns the UTC midnight starting the given date.
#[must_use]
pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// A range of calendar dates for ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Start date (inclusive).
    pub start: NaiveDate,
    /// End date (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new date range, validating that start <= end.
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

    /// Creates a date range for a single day.
    #[must_use]
    pub const fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Returns an iterator over all days in the date range.
    #[must_use]
    pub const fn days(&self) -> DayIterator {
        DayIterator {
            current: Some(self.start),
            end: self.end,
        }
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

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Iterator over all days in a date range.
#[derive(Debug, Clone)]
pub struct DayIterator {
    current: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DayIterator {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let day = self.current.filter(|day| *day <= self.end)?;
        self.current = day.succ_opt();
        Some(day)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let days = self
            .current
            .filter(|day| *day <= self.end)
            .map_or(0, |day| (self.end - day).num_days() as usize + 1);
        (days, Some(days))
    }
}

impl ExactSizeIterator for DayIterator {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_date_range_new() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let range = DateRange::new(start, end).unwrap();

        assert_eq!(range.start, start);
        assert_eq!(range.end, end);
        assert_eq!(range.total_days(), 31);
    }

    #[test]
    fn test_date_range_invalid() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(DateRange::new(start, end).is_err());
    }

    #[test]
    fn test_day_iterator_includes_end() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let range = DateRange::new(start, end).unwrap();
        let days: Vec<_> = range.days().collect();

        assert_eq!(range.days().len(), 4);
        assert_eq!(days.len(), 4);
        assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(days[3], end);
    }

    #[test]
    fn test_single_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let days: Vec<_> = DateRange::single_day(day).days().collect();
        assert_eq!(days, vec![day]);
    }

    #[test]
    fn test_midnight() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let start = midnight(day);
        assert_eq!(start.date_naive(), day);
        assert_eq!(start.hour(), 0);
        assert_eq!(start.minute(), 0);
    }
}
