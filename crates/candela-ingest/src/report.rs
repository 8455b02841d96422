//! Run reports.

use candela_types::{Period, PriceType};
use chrono::NaiveDate;
use std::fmt;

/// Result of one (symbol, quote side, day) base-ingestion tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TupleOutcome {
    /// The archive was decoded and its bars stored.
    Ok {
        /// Minute bars written.
        bars: usize,
        /// True if the archive came from the local cache.
        cached: bool,
    },
    /// The feed had no archive for the tuple.
    Gap(String),
    /// The tuple could not be ingested.
    Failed(String),
}

/// Outcome of one base-ingestion tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleReport {
    /// Currency pair.
    pub symbol: String,
    /// Quote side.
    pub price_type: PriceType,
    /// Calendar day.
    pub day: NaiveDate,
    /// What happened.
    pub outcome: TupleOutcome,
}

impl fmt::Display for TupleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}: ", self.symbol, self.price_type, self.day)?;
        match &self.outcome {
            TupleOutcome::Ok { bars, cached } => {
                write!(f, "ok, {bars} bars")?;
                if *cached {
                    write!(f, " (cached)")?;
                }
                Ok(())
            }
            TupleOutcome::Gap(reason) => write!(f, "gap ({reason})"),
            TupleOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// A fold that could not be completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldFailure {
    /// Currency pair.
    pub symbol: String,
    /// Quote side.
    pub price_type: PriceType,
    /// Day whose bucket was folded.
    pub day: NaiveDate,
    /// Why it failed.
    pub reason: String,
}

/// Outcome of folding one period tier over a date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierReport {
    /// The tier that was folded.
    pub period: Period,
    /// Buckets that held source bars.
    pub folded: usize,
    /// Buckets without source bars.
    pub empty: usize,
    /// Derived bars written.
    pub bars: usize,
    /// Folds that failed.
    pub failures: Vec<FoldFailure>,
}

impl TierReport {
    /// Creates an empty report for a tier.
    #[must_use]
    pub const fn new(period: Period) -> Self {
        Self {
            period,
            folded: 0,
            empty: 0,
            bars: 0,
            failures: Vec::new(),
        }
    }
}

impl fmt::Display for TierReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} buckets folded, {} empty, {} bars written",
            self.period, self.folded, self.empty, self.bars
        )?;
        if !self.failures.is_empty() {
            write!(f, ", {} failed", self.failures.len())?;
        }
        Ok(())
    }
}

/// Per-tuple and per-tier results of a pipeline run.
///
/// A run never aborts on partial failure; this report is how failures
/// surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Base-ingestion tuples, ordered by symbol, quote side and day.
    pub tuples: Vec<TupleReport>,
    /// Folded tiers, in the order they ran.
    pub tiers: Vec<TierReport>,
}

impl RunReport {
    /// Number of tuples ingested successfully.
    #[must_use]
    pub fn ok_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, TupleOutcome::Ok { .. }))
    }

    /// Number of tuples with no published archive.
    #[must_use]
    pub fn gap_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, TupleOutcome::Gap(_)))
    }

    /// Number of tuples that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, TupleOutcome::Failed(_)))
    }

    /// Total minute bars written in the base phase.
    #[must_use]
    pub fn base_bars(&self) -> usize {
        self.tuples
            .iter()
            .map(|tuple| match tuple.outcome {
                TupleOutcome::Ok { bars, .. } => bars,
                _ => 0,
            })
            .sum()
    }

    /// Returns the failed tuples.
    pub fn failures(&self) -> impl Iterator<Item = &TupleReport> {
        self.tuples
            .iter()
            .filter(|tuple| matches!(tuple.outcome, TupleOutcome::Failed(_)))
    }

    /// Returns true if no tuple or fold failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0 && self.tiers.iter().all(|tier| tier.failures.is_empty())
    }

    fn count(&self, pred: impl Fn(&TupleOutcome) -> bool) -> usize {
        self.tuples.iter().filter(|tuple| pred(&tuple.outcome)).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.tuples.is_empty() {
            writeln!(
                f,
                "base: {} ok, {} gaps, {} failed, {} bars written",
                self.ok_count(),
                self.gap_count(),
                self.failed_count(),
                self.base_bars()
            )?;
            for tuple in self.failures() {
                writeln!(f, "  {tuple}")?;
            }
        }
        for tier in &self.tiers {
            writeln!(f, "{tier}")?;
            for failure in &tier.failures {
                writeln!(
                    f,
                    "  {} {} {}: failed: {}",
                    failure.symbol, failure.price_type, failure.day, failure.reason
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(outcome: TupleOutcome) -> TupleReport {
        TupleReport {
            symbol: "EURUSD".to_string(),
            price_type: PriceType::Bid,
            day: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            outcome,
        }
    }

    #[test]
    fn test_counts_and_summary() {
        let report = RunReport {
            tuples: vec![
                tuple(TupleOutcome::Ok { bars: 1440, cached: false }),
                tuple(TupleOutcome::Gap("not published".to_string())),
                tuple(TupleOutcome::Failed("malformed archive".to_string())),
            ],
            tiers: vec![TierReport {
                folded: 2,
                bars: 576,
                ..TierReport::new(Period::Minute5)
            }],
        };

        assert_eq!(report.ok_count(), 1);
        assert_eq!(report.gap_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.base_bars(), 1440);
        assert!(!report.is_clean());

        let text = report.to_string();
        assert!(text.contains("base: 1 ok, 1 gaps, 1 failed, 1440 bars written"));
        assert!(text.contains("EURUSD BID 2024-01-06: failed: malformed archive"));
        assert!(text.contains("M5: 2 buckets folded, 0 empty, 576 bars written"));
    }

    #[test]
    fn test_cached_tuple_display() {
        let report = tuple(TupleOutcome::Ok { bars: 10, cached: true });
        assert_eq!(report.to_string(), "EURUSD BID 2024-01-06: ok, 10 bars (cached)");
    }
}
