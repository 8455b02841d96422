//! Streaming bar-to-bar fold.

use candela_types::{Ohlcv, Period};
use chrono::{DateTime, Utc};

use crate::Bucket;

/// Streaming resampler folding time-ordered source bars into derived bars.
///
/// Source bars are grouped by the window they fall into within a bucket;
/// each window yields one derived bar stamped with the window start.
#[derive(Debug)]
pub struct BarResampler {
    period: Period,
    bucket: Bucket,
    current: Option<OhlcvBuilder>,
}

impl BarResampler {
    /// Creates a resampler for one bucket of the target period.
    #[must_use]
    pub const fn new(period: Period, bucket: Bucket) -> Self {
        Self {
            period,
            bucket,
            current: None,
        }
    }

    /// Returns the target period.
    #[must_use]
    pub const fn period(&self) -> Period {
        self.period
    }

    /// Folds a source bar, potentially emitting a completed derived bar.
    ///
    /// Bars outside the bucket are ignored. Input must be ordered by time.
    pub fn process(&mut self, bar: &Ohlcv) -> Option<Ohlcv> {
        if !self.bucket.contains(bar.time) {
            return None;
        }
        let window = self.bucket.window_start(bar.time, self.period);

        match self.current.take() {
            Some(mut builder) if builder.time == window => {
                builder.update(bar);
                self.current = Some(builder);
                None
            }
            Some(builder) => {
                self.current = Some(OhlcvBuilder::new(window, bar));
                Some(builder.finish())
            }
            None => {
                self.current = Some(OhlcvBuilder::new(window, bar));
                None
            }
        }
    }

    /// Finishes folding, returning the last open window if any.
    #[must_use]
    pub fn finish(self) -> Option<Ohlcv> {
        self.current.map(OhlcvBuilder::finish)
    }

    /// Folds a whole ordered slice of source bars.
    #[must_use]
    pub fn resample(mut self, bars: &[Ohlcv]) -> Vec<Ohlcv> {
        let mut out: Vec<Ohlcv> = bars.iter().filter_map(|bar| self.process(bar)).collect();
        out.extend(self.finish());
        out
    }
}

/// Running fold of one derived bar.
#[derive(Debug)]
struct OhlcvBuilder {
    time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl OhlcvBuilder {
    const fn new(time: DateTime<Utc>, first: &Ohlcv) -> Self {
        Self {
            time,
            open: first.open,
            high: first.high,
            low: first.low,
            close: first.close,
            volume: first.volume,
        }
    }

    fn update(&mut self, bar: &Ohlcv) {
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        self.close = bar.close;
        self.volume += bar.volume;
    }

    const fn finish(self) -> Ohlcv {
        Ohlcv::new(
            self.time,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeDelta, TimeZone, Timelike};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn minute_bar(minute: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Ohlcv {
        let time =
            Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap() + TimeDelta::minutes(minute);
        Ohlcv::new(time, open, high, low, close, volume)
    }

    #[test]
    fn test_fold_five_minute_bars() {
        let bars = vec![
            minute_bar(0, 1.10, 1.115, 1.095, 1.105, 10.0),
            minute_bar(1, 1.11, 1.120, 1.100, 1.110, 20.0),
            minute_bar(2, 1.09, 1.100, 1.085, 1.095, 30.0),
            minute_bar(3, 1.12, 1.125, 1.110, 1.115, 40.0),
            minute_bar(4, 1.10, 1.105, 1.090, 1.100, 50.0),
        ];
        let bucket = Bucket::for_period(day(), Period::Minute5).unwrap();
        let out = BarResampler::new(Period::Minute5, bucket).resample(&bars);

        assert_eq!(out.len(), 1);
        let bar = out[0];
        assert_eq!(bar.time, bars[0].time);
        assert_relative_eq!(bar.open, 1.10);
        assert_relative_eq!(bar.close, 1.10);
        assert_relative_eq!(bar.high, 1.125);
        assert_relative_eq!(bar.low, 1.085);
        assert_relative_eq!(bar.volume, 150.0);
    }

    #[test]
    fn test_windows_split_and_skip_gaps() {
        let bars = vec![
            minute_bar(0, 1.0, 1.0, 1.0, 1.0, 1.0),
            minute_bar(4, 1.0, 1.0, 1.0, 1.0, 1.0),
            minute_bar(5, 2.0, 2.0, 2.0, 2.0, 1.0),
            minute_bar(21, 3.0, 3.0, 3.0, 3.0, 1.0),
        ];
        let bucket = Bucket::for_period(day(), Period::Minute5).unwrap();
        let out = BarResampler::new(Period::Minute5, bucket).resample(&bars);

        let minutes: Vec<u32> = out.iter().map(|bar| bar.time.minute()).collect();
        assert_eq!(minutes, vec![0, 5, 20]);
        assert_relative_eq!(out[0].volume, 2.0);
    }

    #[test]
    fn test_process_emits_on_window_change() {
        let bucket = Bucket::for_period(day(), Period::Hour1).unwrap();
        let mut resampler = BarResampler::new(Period::Hour1, bucket);

        assert!(resampler.process(&minute_bar(0, 1.0, 1.2, 0.9, 1.1, 1.0)).is_none());
        assert!(resampler.process(&minute_bar(30, 1.1, 1.3, 1.0, 1.2, 1.0)).is_none());
        let done = resampler.process(&minute_bar(60, 1.2, 1.2, 1.2, 1.2, 1.0)).unwrap();

        assert_eq!(done.time.hour(), 12);
        assert_relative_eq!(done.high, 1.3);
        assert_eq!(resampler.finish().unwrap().time.hour(), 13);
    }

    #[test]
    fn test_bars_outside_bucket_ignored() {
        let bucket = Bucket::for_period(day(), Period::Minute5).unwrap();
        let stray = Ohlcv::new(
            Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap(),
            1.0,
            1.0,
            1.0,
            1.0,
            1.0,
        );
        let out = BarResampler::new(Period::Minute5, bucket).resample(&[stray]);
        assert!(out.is_empty());
    }
}
