// In crates/strategies/src/classifier.rs

use core_types::{
    CrossEvent, CrossKind, CrossState, Error, IndicatorPoint, IndicatorSeries, Momentum, Result,
};

/// Relative tolerance under which two consecutive gaps count as equal.
const GAP_TIE_TOLERANCE: f64 = 1e-9;

/// The classifier's view of the two most recent fully-defined points.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub state: CrossState,
    pub momentum: Momentum,
    /// Every cross in the series, oldest first.
    pub events: Vec<CrossEvent>,
    pub latest: IndicatorPoint,
    pub previous: IndicatorPoint,
}

impl Classification {
    pub fn last_cross(&self) -> Option<CrossEvent> {
        self.events.last().copied()
    }

    /// `(diff_t, diff_{t-1})`, both defined by construction.
    pub fn diffs(&self) -> (f64, f64) {
        (
            self.latest.diff().unwrap_or_default(),
            self.previous.diff().unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CrossoverClassifier {
    lookback: usize,
    threshold_pct: f64,
}

impl CrossoverClassifier {
    pub fn new(lookback: usize, threshold_pct: f64) -> Self {
        Self {
            lookback: lookback.max(2),
            threshold_pct,
        }
    }

    pub fn classify(&self, series: &IndicatorSeries) -> Result<Classification> {
        let defined: Vec<&IndicatorPoint> = series.defined().collect();
        let n = defined.len();
        if n < 2 {
            return Err(Error::InsufficientHistory {
                required: 2,
                available: n,
            });
        }

        let latest = *defined[n - 1];
        let previous = *defined[n - 2];
        let (Some(slow_t), Some(diff_t), Some(diff_prev)) =
            (latest.slow_ma, latest.diff(), previous.diff())
        else {
            return Err(Error::InsufficientHistory { required: 2, available: n });
        };
        if slow_t == 0.0 || !slow_t.is_finite() {
            return Err(Error::DegenerateSeries { date: latest.date });
        }

        let indexed = cross_events_indexed(&defined);
        // A cross at `idx` sits between points idx-1 and idx; both must be inside the trailing window.
        let window_start = n.saturating_sub(self.lookback);
        let crossed_recently = indexed.iter().any(|(idx, _)| *idx > window_start);

        let momentum = momentum(diff_t, diff_prev);
        let distance_pct = diff_t.abs() / slow_t * 100.0;

        let state = if crossed_recently {
            CrossState::CrossedRecently
        } else if distance_pct <= self.threshold_pct {
            CrossState::Imminent
        } else {
            momentum.into()
        };

        Ok(Classification {
            state,
            momentum,
            events: indexed.into_iter().map(|(_, event)| event).collect(),
            latest,
            previous,
        })
    }
}

/// All crosses in the series, oldest first.
///
/// A cross is recorded where the sign of `fast - slow` differs from the last
/// non-zero sign seen. A zero gap carries the previous sign, so touching without
/// passing through is not a cross.
pub fn cross_events(series: &IndicatorSeries) -> Vec<CrossEvent> {
    let defined: Vec<&IndicatorPoint> = series.defined().collect();
    cross_events_indexed(&defined)
        .into_iter()
        .map(|(_, event)| event)
        .collect()
}

fn cross_events_indexed(defined: &[&IndicatorPoint]) -> Vec<(usize, CrossEvent)> {
    let mut events = Vec::new();
    let mut last_positive: Option<bool> = None;

    for (idx, point) in defined.iter().enumerate() {
        let Some(diff) = point.diff() else { continue };
        if diff == 0.0 {
            continue;
        }
        let positive = diff > 0.0;
        if let Some(was_positive) = last_positive {
            if was_positive != positive {
                let kind = if positive { CrossKind::Golden } else { CrossKind::Death };
                events.push((idx, CrossEvent { kind, date: point.date }));
            }
        }
        last_positive = Some(positive);
    }
    events
}

fn momentum(diff_t: f64, diff_prev: f64) -> Momentum {
    let (gap_t, gap_prev) = (diff_t.abs(), diff_prev.abs());
    let tolerance = GAP_TIE_TOLERANCE * gap_t.max(gap_prev);
    if (gap_t - gap_prev).abs() <= tolerance {
        Momentum::Stable
    } else if gap_t < gap_prev {
        Momentum::Converging
    } else {
        Momentum::Diverging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moving_average::MovingAverageCalculator;
    use chrono::{Duration, NaiveDate};
    use core_types::{MaKind, PricePoint, PriceSeries};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
    }

    fn series_from(closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint { date: start() + Duration::days(i as i64), close: *c })
            .collect();
        PriceSeries::new("TEST".into(), points).unwrap()
    }

    fn indicator(diffs: &[(f64, f64)]) -> IndicatorSeries {
        let points = diffs
            .iter()
            .enumerate()
            .map(|(i, (fast, slow))| IndicatorPoint {
                date: start() + Duration::days(i as i64),
                close: *slow,
                fast_ma: Some(*fast),
                slow_ma: Some(*slow),
            })
            .collect();
        IndicatorSeries { symbol: "TEST".into(), points }
    }

    #[test]
    fn linear_uptrend_keeps_fast_above_slow_without_recent_cross() {
        let closes: Vec<f64> = (0..260).map(|i| 100.0 + 100.0 * i as f64 / 259.0).collect();
        let calc = MovingAverageCalculator::new(50, 200, MaKind::Sma).unwrap();
        let indicators = calc.compute(&series_from(&closes)).unwrap();

        let result = CrossoverClassifier::new(20, 1.0).classify(&indicators).unwrap();
        let fast = result.latest.fast_ma.unwrap();
        let slow = result.latest.slow_ma.unwrap();

        assert!(fast > slow);
        assert!(cross_events(&indicators).is_empty());
        assert!(matches!(result.state, CrossState::Diverging | CrossState::Stable));
    }

    #[test]
    fn step_down_develops_fast_below_slow() {
        let mut closes = vec![50.0; 200];
        closes.extend(std::iter::repeat(45.0).take(60));
        let calc = MovingAverageCalculator::new(50, 200, MaKind::Sma).unwrap();
        let indicators = calc.compute(&series_from(&closes)).unwrap();

        let result = CrossoverClassifier::new(20, 1.0).classify(&indicators).unwrap();
        let fast = result.latest.fast_ma.unwrap();
        let slow = result.latest.slow_ma.unwrap();
        let distance_pct = (fast - slow).abs() / slow * 100.0;

        assert!(fast < slow);
        assert!(distance_pct > 0.0 && distance_pct < 100.0);
        // The gap opened from zero, which is not a cross.
        assert!(result.events.is_empty());
    }

    #[test]
    fn recent_sign_flip_is_crossed_recently() {
        let series = indicator(&[(9.0, 10.0), (9.5, 10.0), (10.5, 10.0), (10.8, 10.0)]);
        let result = CrossoverClassifier::new(3, 1.0).classify(&series).unwrap();
        assert_eq!(result.state, CrossState::CrossedRecently);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].kind, CrossKind::Golden);
        assert_eq!(result.events[0].date, start() + Duration::days(2));
    }

    #[test]
    fn cross_outside_window_is_not_recent() {
        let series = indicator(&[
            (11.0, 10.0),
            (9.0, 10.0),
            (8.0, 10.0),
            (7.0, 10.0),
            (7.5, 10.0),
        ]);
        let result = CrossoverClassifier::new(2, 1.0).classify(&series).unwrap();
        assert_eq!(result.last_cross().map(|e| e.kind), Some(CrossKind::Death));
        assert_eq!(result.state, CrossState::Converging);
        assert_eq!(result.momentum, Momentum::Converging);
    }

    #[test]
    fn cross_straddling_window_edge_is_not_recent() {
        let series = indicator(&[
            (11.0, 10.0),
            (9.0, 10.0),
            (8.0, 10.0),
            (7.0, 10.0),
            (7.5, 10.0),
        ]);
        // The flip sits between points 0 and 1; a 4-point window only holds points 1..=4.
        let result = CrossoverClassifier::new(4, 1.0).classify(&series).unwrap();
        assert_ne!(result.state, CrossState::CrossedRecently);
        assert_eq!(result.events.len(), 1);

        let result = CrossoverClassifier::new(5, 1.0).classify(&series).unwrap();
        assert_eq!(result.state, CrossState::CrossedRecently);
    }

    #[test]
    fn one_point_lookback_still_needs_both_sides_of_the_flip() {
        let series = indicator(&[(9.0, 10.0), (9.5, 10.0), (10.5, 10.0)]);
        // Clamped to two points, which covers the latest pair.
        let result = CrossoverClassifier::new(1, 1.0).classify(&series).unwrap();
        assert_eq!(result.state, CrossState::CrossedRecently);

        let series = indicator(&[(9.0, 10.0), (10.5, 10.0), (10.8, 10.0)]);
        let result = CrossoverClassifier::new(1, 0.0).classify(&series).unwrap();
        assert_ne!(result.state, CrossState::CrossedRecently);
    }

    #[test]
    fn touching_zero_does_not_count_as_cross() {
        let series = indicator(&[(9.0, 10.0), (10.0, 10.0), (9.0, 10.0)]);
        assert!(cross_events(&series).is_empty());
    }

    #[test]
    fn near_gap_is_imminent_but_keeps_momentum() {
        let series = indicator(&[(95.0, 100.0), (99.5, 100.0), (99.2, 100.0)]);
        let result = CrossoverClassifier::new(5, 1.0).classify(&series).unwrap();
        assert_eq!(result.state, CrossState::Imminent);
        assert_eq!(result.momentum, Momentum::Diverging);
    }

    #[test]
    fn momentum_ties_are_stable() {
        let series = indicator(&[(90.0, 100.0), (110.0, 100.0), (120.0, 110.0)]);
        let result = CrossoverClassifier::new(2, 0.0).classify(&series).unwrap();
        assert_eq!(result.momentum, Momentum::Stable);
        assert_eq!(result.state, CrossState::Stable);
    }

    #[test]
    fn zero_slow_average_is_degenerate() {
        let series = indicator(&[(1.0, 2.0), (1.0, 0.0)]);
        let err = CrossoverClassifier::new(5, 1.0).classify(&series).unwrap_err();
        assert!(matches!(err, Error::DegenerateSeries { .. }));
    }

    #[test]
    fn single_defined_point_is_insufficient() {
        let series = indicator(&[(1.0, 2.0)]);
        let err = CrossoverClassifier::new(5, 1.0).classify(&series).unwrap_err();
        assert_eq!(err, Error::InsufficientHistory { required: 2, available: 1 });
    }

    #[test]
    fn classification_is_idempotent() {
        let closes: Vec<f64> = (0..300)
            .map(|i| 100.0 + 10.0 * (i as f64 / 15.0).sin() + i as f64 * 0.05)
            .collect();
        let calc = MovingAverageCalculator::new(10, 40, MaKind::Ema).unwrap();
        let indicators = calc.compute(&series_from(&closes)).unwrap();
        let classifier = CrossoverClassifier::new(20, 1.0);

        let first = classifier.classify(&indicators).unwrap();
        let second = classifier.classify(&indicators).unwrap();
        assert_eq!(first, second);
        assert!(!first.events.is_empty());
    }
}
