// In crates/core-types/src/types.rs

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An instrument ticker, e.g. "AAPL" or "BRK-B".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol(value.to_string())
    }
}

/// A daily close exactly as the data provider returned it, before cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPricePoint {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

/// A validated daily close. `close` is always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// The cleaned close history of a single instrument.
///
/// Dates are strictly increasing and there is at least one point.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: Symbol,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, rejecting anything that breaks the ordering or positivity invariants.
    pub fn new(symbol: Symbol, points: Vec<PricePoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InvalidSeries(format!("{symbol}: series is empty")));
        }
        if let Some(bad) = points.iter().find(|p| !p.close.is_finite() || p.close <= 0.0) {
            return Err(Error::InvalidSeries(format!(
                "{symbol}: non-positive close {} on {}",
                bad.close, bad.date
            )));
        }
        if let Some(pair) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(Error::InvalidSeries(format!(
                "{symbol}: dates not strictly increasing ({} then {})",
                pair[0].date, pair[1].date
            )));
        }
        Ok(Self { symbol, points })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series; present for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn last(&self) -> &PricePoint {
        // The constructor guarantees at least one point.
        &self.points[self.points.len() - 1]
    }
}

/// Which family of moving average to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaKind {
    #[default]
    #[serde(alias = "SMA")]
    Sma,
    #[serde(alias = "EMA")]
    Ema,
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaKind::Sma => f.write_str("SMA"),
            MaKind::Ema => f.write_str("EMA"),
        }
    }
}

/// One row of the indicator series, parallel to the price series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub fast_ma: Option<f64>,
    pub slow_ma: Option<f64>,
}

impl IndicatorPoint {
    /// `fast_ma - slow_ma`, when both averages have enough history.
    pub fn diff(&self) -> Option<f64> {
        Some(self.fast_ma? - self.slow_ma?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub symbol: Symbol,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// The points where both averages are defined, oldest first.
    pub fn defined(&self) -> impl Iterator<Item = &IndicatorPoint> {
        self.points
            .iter()
            .filter(|p| p.fast_ma.is_some() && p.slow_ma.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossKind {
    /// Fast average rising above the slow one.
    Golden,
    /// Fast average falling below the slow one.
    Death,
}

impl fmt::Display for CrossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossKind::Golden => f.write_str("Golden"),
            CrossKind::Death => f.write_str("Death"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossEvent {
    pub kind: CrossKind,
    pub date: NaiveDate,
}

/// How the gap between the averages moved over the last bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Momentum {
    Converging,
    Diverging,
    Stable,
}

/// The reported relationship between the fast and slow averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossState {
    CrossedRecently,
    Imminent,
    Converging,
    Diverging,
    Stable,
}

impl From<Momentum> for CrossState {
    fn from(value: Momentum) -> Self {
        match value {
            Momentum::Converging => CrossState::Converging,
            Momentum::Diverging => CrossState::Diverging,
            Momentum::Stable => CrossState::Stable,
        }
    }
}

impl fmt::Display for CrossState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CrossState::CrossedRecently => "crossed recently",
            CrossState::Imminent => "imminent",
            CrossState::Converging => "converging",
            CrossState::Diverging => "diverging",
            CrossState::Stable => "stable",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn series_rejects_unordered_dates() {
        let points = vec![
            PricePoint { date: day(2), close: 10.0 },
            PricePoint { date: day(2), close: 11.0 },
        ];
        let err = PriceSeries::new("AAA".into(), points).unwrap_err();
        assert!(matches!(err, Error::InvalidSeries(_)));
    }

    #[test]
    fn series_rejects_empty_and_non_positive() {
        assert!(PriceSeries::new("AAA".into(), vec![]).is_err());
        let points = vec![PricePoint { date: day(1), close: 0.0 }];
        assert!(PriceSeries::new("AAA".into(), points).is_err());
    }

    #[test]
    fn ma_kind_accepts_both_spellings() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: MaKind,
        }
        let upper: Wrapper = serde_json::from_str(r#"{"kind":"EMA"}"#).unwrap();
        let lower: Wrapper = serde_json::from_str(r#"{"kind":"sma"}"#).unwrap();
        assert_eq!(upper.kind, MaKind::Ema);
        assert_eq!(lower.kind, MaKind::Sma);
    }

    #[test]
    fn indicator_diff_requires_both_averages() {
        let p = IndicatorPoint { date: day(1), close: 1.0, fast_ma: Some(2.0), slow_ma: None };
        assert_eq!(p.diff(), None);
        let p = IndicatorPoint { slow_ma: Some(3.5), ..p };
        assert_eq!(p.diff(), Some(-1.5));
    }
}
