// In crates/strategies/src/moving_average.rs

use core_types::{Error, IndicatorPoint, IndicatorSeries, MaKind, PriceSeries, Result};
use ta::indicators::SimpleMovingAverage as Sma;
use ta::Next;

/// Computes the fast and slow moving averages for a cleaned series.
#[derive(Debug, Clone, Copy)]
pub struct MovingAverageCalculator {
    fast_period: usize,
    slow_period: usize,
    kind: MaKind,
}

impl MovingAverageCalculator {
    pub fn new(fast_period: usize, slow_period: usize, kind: MaKind) -> Result<Self> {
        if fast_period == 0 || fast_period >= slow_period {
            return Err(Error::Configuration(format!(
                "invalid moving average windows: fast {fast_period}, slow {slow_period}"
            )));
        }
        Ok(Self {
            fast_period,
            slow_period,
            kind,
        })
    }

    pub fn slow_period(&self) -> usize {
        self.slow_period
    }

    pub fn compute(&self, series: &PriceSeries) -> Result<IndicatorSeries> {
        if series.len() < self.slow_period {
            return Err(Error::InsufficientHistory {
                required: self.slow_period,
                available: series.len(),
            });
        }

        let closes = series.closes();
        let (fast, slow) = match self.kind {
            MaKind::Sma => (sma(&closes, self.fast_period)?, sma(&closes, self.slow_period)?),
            MaKind::Ema => (ema(&closes, self.fast_period), ema(&closes, self.slow_period)),
        };

        let points = series
            .points()
            .iter()
            .zip(fast)
            .zip(slow)
            .map(|((p, fast_ma), slow_ma)| IndicatorPoint {
                date: p.date,
                close: p.close,
                fast_ma,
                slow_ma,
            })
            .collect();

        Ok(IndicatorSeries {
            symbol: series.symbol().clone(),
            points,
        })
    }
}

/// Simple moving average; `None` until `period` closes have been seen.
pub fn sma(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut indicator = Sma::new(period)
        .map_err(|e| Error::Configuration(format!("SMA period {period}: {e:?}")))?;
    Ok(closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let value = indicator.next(*close);
            (i + 1 >= period).then_some(value)
        })
        .collect())
}

/// Exponential moving average with `alpha = 2 / (period + 1)`.
///
/// The first defined value, at index `period - 1`, is the plain mean of the first
/// `period` closes rather than a single raw close.
pub fn ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut current = closes[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(current);
    for (i, close) in closes.iter().enumerate().skip(period) {
        current = alpha * close + (1.0 - alpha) * current;
        out[i] = Some(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use core_types::PricePoint;

    fn series_from(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint { date: start + Duration::days(i as i64), close: *c })
            .collect();
        PriceSeries::new("TEST".into(), points).unwrap()
    }

    #[test]
    fn sma_is_undefined_until_window_fills() {
        let values = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(values, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn ema_seeds_with_mean_of_first_window() {
        let values = ema(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_eq!(values[..2], [None, None]);
        assert_eq!(values[2], Some(4.0));
        // alpha = 0.5
        assert_eq!(values[3], Some(6.0));
    }

    #[test]
    fn ema_of_constant_series_equals_constant_at_seed() {
        for n in [1usize, 5, 20, 50, 200] {
            let closes = vec![37.25; n + 3];
            let values = ema(&closes, n);
            assert_eq!(values[n - 1], Some(37.25), "period {n}");
        }
    }

    #[test]
    fn compute_rejects_short_series() {
        let calc = MovingAverageCalculator::new(3, 5, MaKind::Sma).unwrap();
        let err = calc.compute(&series_from(&[1.0, 2.0, 3.0, 4.0])).unwrap_err();
        assert_eq!(err, Error::InsufficientHistory { required: 5, available: 4 });
    }

    #[test]
    fn compute_aligns_both_windows_with_dates() {
        let calc = MovingAverageCalculator::new(2, 4, MaKind::Sma).unwrap();
        let indicators = calc.compute(&series_from(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        assert_eq!(indicators.points.len(), 5);
        assert_eq!(indicators.points[0].fast_ma, None);
        assert_eq!(indicators.points[1].fast_ma, Some(1.5));
        assert_eq!(indicators.points[2].slow_ma, None);
        assert_eq!(indicators.points[3].slow_ma, Some(2.5));
        assert_eq!(indicators.points[4].fast_ma, Some(4.5));
        assert_eq!(indicators.defined().count(), 2);
    }

    #[test]
    fn constructor_rejects_bad_windows() {
        assert!(MovingAverageCalculator::new(0, 5, MaKind::Sma).is_err());
        assert!(MovingAverageCalculator::new(5, 5, MaKind::Ema).is_err());
    }
}
