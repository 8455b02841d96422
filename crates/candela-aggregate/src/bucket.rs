//! Calendar-aligned aggregation buckets.

use candela_types::{Period, midnight};
use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, Utc};

use crate::AggregateError;

/// A bucket ends one microsecond before the next one starts.
fn epsilon() -> TimeDelta {
    TimeDelta::microseconds(1)
}

/// Calendar span a derived period is folded over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKind {
    /// Midnight to midnight.
    Day,
    /// Sunday midnight to the following Sunday midnight.
    Week,
    /// First of the month to the first of the next month.
    Month,
}

impl BucketKind {
    /// Returns the bucket kind for a derived period.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::NotDerived`] for tick and one-minute
    /// periods, which are never folded.
    pub fn for_period(period: Period) -> Result<Self, AggregateError> {
        match period.minutes() {
            5..=1440 => Ok(Self::Day),
            1441..=10080 => Ok(Self::Week),
            10081.. => Ok(Self::Month),
            _ => Err(AggregateError::NotDerived(period)),
        }
    }
}

/// A transient `[from, before]` interval (both inclusive) scoping one fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bucket {
    kind: BucketKind,
    from: DateTime<Utc>,
    before: DateTime<Utc>,
}

impl Bucket {
    /// Computes the bucket containing `date` under `period`'s granularity.
    ///
    /// # Errors
    ///
    /// Returns an error if `period` is not a derived period or the bucket
    /// falls outside the representable calendar.
    pub fn for_period(date: NaiveDate, period: Period) -> Result<Self, AggregateError> {
        let kind = BucketKind::for_period(period)?;

        let (start, next) = match kind {
            BucketKind::Day => (date, date.succ_opt()),
            BucketKind::Week => {
                let back = i64::from(date.weekday().num_days_from_sunday());
                let sunday = date - TimeDelta::days(back);
                (sunday, sunday.checked_add_signed(TimeDelta::days(7)))
            }
            BucketKind::Month => {
                let first = date.with_day(1).ok_or(AggregateError::OutOfRange(date))?;
                (first, first.checked_add_months(Months::new(1)))
            }
        };
        let next = next.ok_or(AggregateError::OutOfRange(date))?;

        Ok(Self {
            kind,
            from: midnight(start),
            before: midnight(next) - epsilon(),
        })
    }

    /// Returns the bucket kind.
    #[must_use]
    pub const fn kind(&self) -> BucketKind {
        self.kind
    }

    /// Returns the bucket start instant.
    #[must_use]
    pub const fn from(&self) -> DateTime<Utc> {
        self.from
    }

    /// Returns the last instant inside the bucket.
    #[must_use]
    pub const fn before(&self) -> DateTime<Utc> {
        self.before
    }

    /// Returns the calendar date the bucket starts on.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.from.date_naive()
    }

    /// Returns true if the instant falls inside the bucket.
    #[must_use]
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.from && time <= self.before
    }

    /// Returns the start of the derived bar a source bar at `time` folds into.
    ///
    /// Daily buckets are cut into consecutive `period`-minute windows aligned
    /// to midnight; weekly and monthly buckets hold a single window.
    #[must_use]
    pub fn window_start(&self, time: DateTime<Utc>, period: Period) -> DateTime<Utc> {
        match self.kind {
            BucketKind::Day => {
                let width = i64::from(period.minutes().max(1));
                let offset = (time - self.from).num_minutes();
                self.from + TimeDelta::minutes(offset.div_euclid(width) * width)
            }
            BucketKind::Week | BucketKind::Month => self.from,
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.from.to_rfc3339(), self.before.to_rfc3339())
    }
}
