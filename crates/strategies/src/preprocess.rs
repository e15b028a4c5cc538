// In crates/strategies/src/preprocess.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use core_types::{Error, PricePoint, PriceSeries, RawPricePoint, Result, Symbol};

/// Cleans a raw provider series into a usable `PriceSeries`.
///
/// Missing, non-finite and non-positive closes are dropped, the remaining points are
/// sorted by date, and when a date appears more than once the occurrence that came
/// last in `raw` wins. Fails with `InsufficientHistory` if fewer than `min_len`
/// points survive.
pub fn preprocess(symbol: &Symbol, raw: &[RawPricePoint], min_len: usize) -> Result<PriceSeries> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for point in raw {
        if let Some(close) = point.close.filter(|c| c.is_finite() && *c > 0.0) {
            by_date.insert(point.date, close);
        }
    }

    let available = by_date.len();
    if available < min_len.max(1) {
        return Err(Error::InsufficientHistory {
            required: min_len.max(1),
            available,
        });
    }

    let points = by_date
        .into_iter()
        .map(|(date, close)| PricePoint { date, close })
        .collect();
    PriceSeries::new(symbol.clone(), points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(day: u32, close: Option<f64>) -> RawPricePoint {
        RawPricePoint {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            close,
        }
    }

    #[test]
    fn drops_bad_closes_and_keeps_latest_duplicate() {
        let input = vec![
            raw(3, Some(12.0)),
            raw(1, Some(10.0)),
            raw(2, None),
            raw(4, Some(-1.0)),
            raw(5, Some(f64::NAN)),
            raw(1, Some(10.5)),
            raw(6, Some(0.0)),
        ];
        let series = preprocess(&"AAA".into(), &input, 1).unwrap();
        let closes = series.closes();
        assert_eq!(closes, vec![10.5, 12.0]);
        assert_eq!(series.points()[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn short_series_is_insufficient() {
        let input: Vec<_> = (1..=5).map(|d| raw(d, Some(1.0 + d as f64))).collect();
        let err = preprocess(&"AAA".into(), &input, 6).unwrap_err();
        assert_eq!(err, Error::InsufficientHistory { required: 6, available: 5 });
    }

    #[test]
    fn empty_input_is_insufficient_not_invalid() {
        let err = preprocess(&"AAA".into(), &[], 0).unwrap_err();
        assert!(matches!(err, Error::InsufficientHistory { available: 0, .. }));
    }
}
