// In crates/strategies/src/scorer.rs

use core_types::CrossKind;

use crate::types::ScoringSettings;

/// How close the averages are and how fast the gap is closing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    pub distance_pct: f64,
    /// `|diff_{t-1}| - |diff_t|`, positive while converging.
    pub velocity: f64,
    /// `velocity` as a percent of the slow average.
    pub slope: f64,
    /// Bars until the gap closes at the current velocity. `None` when not converging.
    pub projected_days_to_cross: Option<f64>,
    pub direction: CrossKind,
}

/// Turns the last two gaps into a proximity measurement and a ranking score.
///
/// The score is a heuristic ranking aid, not a probability. It never decreases as
/// the distance shrinks or as the slope grows.
#[derive(Debug, Clone)]
pub struct ProximityScorer {
    settings: ScoringSettings,
}

impl ProximityScorer {
    pub fn new(settings: ScoringSettings) -> Self {
        Self { settings }
    }

    /// `slow_t` must be non-zero; the classifier rejects degenerate series first.
    pub fn measure(&self, diff_t: f64, diff_prev: f64, slow_t: f64) -> Proximity {
        let gap = diff_t.abs();
        let velocity = diff_prev.abs() - gap;
        let projected_days_to_cross = (velocity > 0.0).then(|| gap / velocity);

        Proximity {
            distance_pct: gap / slow_t * 100.0,
            velocity,
            slope: velocity / slow_t * 100.0,
            projected_days_to_cross,
            // A fast average below the slow one can only cross upwards.
            direction: if diff_t < 0.0 { CrossKind::Golden } else { CrossKind::Death },
        }
    }

    pub fn score(&self, distance_pct: f64, slope: f64, direction: CrossKind) -> f64 {
        let s = &self.settings;
        let closeness = (s.distance_cap - distance_pct * s.distance_scale).max(0.0);
        // Only a closing gap earns velocity credit.
        let speed = (slope * s.velocity_scale).min(s.velocity_cap).max(0.0);
        let bonus = match direction {
            CrossKind::Golden => s.golden_bonus,
            CrossKind::Death => 0.0,
        };

        let raw = s.distance_weight * closeness + s.velocity_weight * speed + s.golden_weight * bonus;
        if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 100.0) }
    }

    pub fn score_proximity(&self, proximity: &Proximity) -> f64 {
        self.score(proximity.distance_pct, proximity.slope, proximity.direction)
    }
}
