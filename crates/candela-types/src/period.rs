//! Candle period definitions and the derivation chain.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::PeriodError;

/// Candle timeframe, measured in minutes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Tick-by-tick (no aggregation).
    Tick,
    /// 1-minute bars, the base granularity of the archive feed.
    #[default]
    #[serde(rename = "m1")]
    Minute1,
    /// 5-minute bars.
    #[serde(rename = "m5")]
    Minute5,
    /// 15-minute bars.
    #[serde(rename = "m15")]
    Minute15,
    /// 30-minute bars.
    #[serde(rename = "m30")]
    Minute30,
    /// 1-hour bars.
    #[serde(rename = "h1")]
    Hour1,
    /// 4-hour bars.
    #[serde(rename = "h4")]
    Hour4,
    /// Daily bars.
    #[serde(rename = "d1")]
    Day1,
    /// Weekly bars (Sunday to Saturday).
    #[serde(rename = "w1")]
    Week1,
    /// Calendar-month bars.
    #[serde(rename = "mn")]
    Month1,
}

impl Period {
    /// Returns the nominal length in minutes (0 for tick data).
    #[must_use]
    pub const fn minutes(&self) -> u32 {
        match self {
            Self::Tick => 0,
            Self::Minute1 => 1,
            Self::Minute5 => 5,
            Self::Minute15 => 15,
            Self::Minute30 => 30,
            Self::Hour1 => 60,
            Self::Hour4 => 240,
            Self::Day1 => 1440,
            Self::Week1 => 10080,
            Self::Month1 => 43200,
        }
    }

    /// Looks up a period by its minute count.
    #[must_use]
    pub const fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            0 => Some(Self::Tick),
            1 => Some(Self::Minute1),
            5 => Some(Self::Minute5),
            15 => Some(Self::Minute15),
            30 => Some(Self::Minute30),
            60 => Some(Self::Hour1),
            240 => Some(Self::Hour4),
            1440 => Some(Self::Day1),
            10080 => Some(Self::Week1),
            43200 => Some(Self::Month1),
            _ => None,
        }
    }

    /// Returns the conventional short name (M1, H4, MN, ...).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tick => "Tick",
            Self::Minute1 => "M1",
            Self::Minute5 => "M5",
            Self::Minute15 => "M15",
            Self::Minute30 => "M30",
            Self::Hour1 => "H1",
            Self::Hour4 => "H4",
            Self::Day1 => "D1",
            Self::Week1 => "W1",
            Self::Month1 => "MN",
        }
    }

    /// Returns all periods, ascending.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Tick,
            Self::Minute1,
            Self::Minute5,
            Self::Minute15,
            Self::Minute30,
            Self::Hour1,
            Self::Hour4,
            Self::Day1,
            Self::Week1,
            Self::Month1,
        ]
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tick" | "0" => Ok(Self::Tick),
            "m1" | "1m" | "1" | "minute" => Ok(Self::Minute1),
            "m5" | "5m" | "5" => Ok(Self::Minute5),
            "m15" | "15m" | "15" => Ok(Self::Minute15),
            "m30" | "30m" | "30" => Ok(Self::Minute30),
            "h1" | "1h" | "60" | "hour" => Ok(Self::Hour1),
            "h4" | "4h" | "240" => Ok(Self::Hour4),
            "d1" | "1d" | "1440" | "day" | "daily" => Ok(Self::Day1),
            "w1" | "1w" | "10080" | "week" | "weekly" => Ok(Self::Week1),
            "mn" | "mn1" | "43200" | "month" | "monthly" => Ok(Self::Month1),
            _ => Err(PeriodError::Unknown(s.to_string())),
        }
    }
}

/// Ordered chain of periods; every entry after the first is folded from an
/// earlier one.
///
/// Each tier is derived from the entry immediately before it, except the
/// monthly tier, which is always derived from daily bars when the chain
/// contains them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Period>", into = "Vec<Period>")]
pub struct PeriodChain {
    periods: Vec<Period>,
}

impl PeriodChain {
    /// Creates a chain, validating that it starts at one minute and is
    /// strictly ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain is empty, does not start at
    /// [`Period::Minute1`] or is not strictly ascending.
    pub fn new(periods: Vec<Period>) -> Result<Self, PeriodError> {
        let Some(&first) = periods.first() else {
            return Err(PeriodError::EmptyChain);
        };
        if first != Period::Minute1 {
            return Err(PeriodError::BadBase(first.to_string()));
        }
        if let Some(pair) = periods.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PeriodError::NotAscending(pair[1].to_string()));
        }
        Ok(Self { periods })
    }

    /// Returns the base period of the chain.
    #[must_use]
    pub fn base(&self) -> Period {
        self.periods[0]
    }

    /// Returns every period of the chain, ascending.
    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Returns the derived tiers (every period after the base), ascending.
    #[must_use]
    pub fn derived(&self) -> &[Period] {
        &self.periods[1..]
    }

    /// Returns true if the chain contains the period.
    #[must_use]
    pub fn contains(&self, period: Period) -> bool {
        self.periods.contains(&period)
    }

    /// Returns the period a tier is folded from.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::NoSource`] if the period is the base or not in
    /// the chain.
    pub fn source_for(&self, target: Period) -> Result<Period, PeriodError> {
        let index = self
            .periods
            .iter()
            .position(|&p| p == target)
            .filter(|&i| i > 0)
            .ok_or_else(|| PeriodError::NoSource(target.to_string()))?;

        if target == Period::Month1 && self.contains(Period::Day1) {
            return Ok(Period::Day1);
        }
        Ok(self.periods[index - 1])
    }
}

impl Default for PeriodChain {
    fn default() -> Self {
        Self {
            periods: Period::all()[1..].to_vec(),
        }
    }
}

impl TryFrom<Vec<Period>> for PeriodChain {
    type Error = PeriodError;

    fn try_from(periods: Vec<Period>) -> Result<Self, Self::Error> {
        Self::new(periods)
    }
}

impl From<PeriodChain> for Vec<Period> {
    fn from(chain: PeriodChain) -> Self {
        chain.periods
    }
}
