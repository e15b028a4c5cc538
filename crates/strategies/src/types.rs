// In crates/strategies/src/types.rs

use core_types::{Error, MaKind, Result};
use serde::{Deserialize, Serialize};

/// Which instruments a scan is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Averages that are closing in on each other and have not crossed yet.
    #[default]
    Anticipation,
    /// Anything whose averages sit within the distance threshold.
    Proximity,
    /// Only instruments whose averages crossed inside the look-back window.
    ExactCross,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DetectionSettings {
    #[serde(default = "default_fast_period")]
    pub fast_period: u32,
    #[serde(default = "default_slow_period")]
    pub slow_period: u32,
    #[serde(default)]
    pub ma_kind: MaKind,
    /// Number of trailing bars in which a cross counts as recent.
    #[serde(default = "default_cross_lookback")]
    pub cross_lookback: u32,
    /// Gap between the averages, as a percent of the slow one, that counts as imminent.
    #[serde(default = "default_threshold_pct")]
    pub threshold_pct: f64,
    #[serde(default)]
    pub mode: DetectionMode,
    #[serde(default)]
    pub scoring: ScoringSettings,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            fast_period: default_fast_period(),
            slow_period: default_slow_period(),
            ma_kind: MaKind::default(),
            cross_lookback: default_cross_lookback(),
            threshold_pct: default_threshold_pct(),
            mode: DetectionMode::default(),
            scoring: ScoringSettings::default(),
        }
    }
}

impl DetectionSettings {
    pub fn validate(&self) -> Result<()> {
        if self.fast_period == 0 || self.slow_period == 0 {
            return Err(Error::Configuration(
                "moving average windows must be positive".to_string(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(Error::Configuration(format!(
                "fast window ({}) must be shorter than slow window ({})",
                self.fast_period, self.slow_period
            )));
        }
        if self.cross_lookback < 2 {
            return Err(Error::Configuration(format!(
                "cross_lookback must cover at least 2 points, got {}",
                self.cross_lookback
            )));
        }
        if !self.threshold_pct.is_finite() || self.threshold_pct < 0.0 {
            return Err(Error::Configuration(format!(
                "threshold_pct must be a non-negative number, got {}",
                self.threshold_pct
            )));
        }
        self.scoring.validate()
    }
}

/// Tunable constants of the heuristic score.
///
/// `score = clamp(0, 100, distance_weight * max(0, distance_cap - distance_pct * distance_scale)
///        + velocity_weight * max(0, min(velocity_cap, slope * velocity_scale))
///        + golden_weight * golden_bonus)`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScoringSettings {
    pub distance_weight: f64,
    pub distance_cap: f64,
    pub distance_scale: f64,
    pub velocity_weight: f64,
    pub velocity_cap: f64,
    pub velocity_scale: f64,
    pub golden_weight: f64,
    pub golden_bonus: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            distance_weight: 1.0,
            distance_cap: 50.0,
            distance_scale: 50.0,
            velocity_weight: 1.0,
            velocity_cap: 40.0,
            velocity_scale: 100.0,
            golden_weight: 1.0,
            golden_bonus: 10.0,
        }
    }
}

impl ScoringSettings {
    /// Negative constants would flip the score's monotonicity, so they are rejected.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("distance_weight", self.distance_weight),
            ("distance_cap", self.distance_cap),
            ("distance_scale", self.distance_scale),
            ("velocity_weight", self.velocity_weight),
            ("velocity_cap", self.velocity_cap),
            ("velocity_scale", self.velocity_scale),
            ("golden_weight", self.golden_weight),
            ("golden_bonus", self.golden_bonus),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Configuration(format!(
                    "scoring.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Helper functions for serde defaults
fn default_fast_period() -> u32 { 50 }
fn default_slow_period() -> u32 { 200 }
fn default_cross_lookback() -> u32 { 20 }
fn default_threshold_pct() -> f64 { 1.0 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DetectionSettings::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_windows() {
        let settings = DetectionSettings { fast_period: 200, slow_period: 50, ..Default::default() };
        assert!(matches!(settings.validate(), Err(Error::Configuration(_))));

        let settings = DetectionSettings { fast_period: 50, slow_period: 50, ..Default::default() };
        assert!(matches!(settings.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn rejects_zero_window_and_negative_threshold() {
        let settings = DetectionSettings { fast_period: 0, ..Default::default() };
        assert!(settings.validate().is_err());

        let settings = DetectionSettings { threshold_pct: -0.5, ..Default::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_lookback_shorter_than_a_point_pair() {
        for cross_lookback in [0, 1] {
            let settings = DetectionSettings { cross_lookback, ..Default::default() };
            assert!(matches!(settings.validate(), Err(Error::Configuration(_))));
        }
        let settings = DetectionSettings { cross_lookback: 2, ..Default::default() };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_negative_scoring_weight() {
        let mut settings = DetectionSettings::default();
        settings.scoring.velocity_weight = -1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: DetectionSettings =
            serde_json::from_str(r#"{"fast_period": 20, "ma_kind": "EMA", "mode": "exact_cross"}"#).unwrap();
        assert_eq!(settings.fast_period, 20);
        assert_eq!(settings.slow_period, 200);
        assert_eq!(settings.ma_kind, MaKind::Ema);
        assert_eq!(settings.mode, DetectionMode::ExactCross);
        assert_eq!(settings.scoring, ScoringSettings::default());
    }
}
