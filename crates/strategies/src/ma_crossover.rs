// In crates/strategies/src/ma_crossover.rs

use core_types::{CrossState, RawPricePoint, Result, ScanResult, SkipReason, Symbol};

use crate::classifier::CrossoverClassifier;
use crate::moving_average::MovingAverageCalculator;
use crate::preprocess::preprocess;
use crate::scorer::ProximityScorer;
use crate::types::{DetectionMode, DetectionSettings};
use crate::Detector;

/// The fast/slow moving-average crossover detector.
///
/// Every detection mode shares the same pipeline:
/// preprocess -> moving averages -> classify -> measure and score.
/// Only the admission rule in `exclusion_reason` differs between modes.
#[derive(Debug)]
pub struct MaCrossoverDetector {
    mode: DetectionMode,
    calculator: MovingAverageCalculator,
    classifier: CrossoverClassifier,
    scorer: ProximityScorer,
}

impl MaCrossoverDetector {
    /// Creates a detector from settings. Call `DetectionSettings::validate` first;
    /// the factory does this for you.
    pub fn new(settings: &DetectionSettings) -> Result<Self> {
        Ok(Self {
            mode: settings.mode,
            calculator: MovingAverageCalculator::new(
                settings.fast_period as usize,
                settings.slow_period as usize,
                settings.ma_kind,
            )?,
            classifier: CrossoverClassifier::new(settings.cross_lookback as usize, settings.threshold_pct),
            scorer: ProximityScorer::new(settings.scoring.clone()),
        })
    }
}

impl Detector for MaCrossoverDetector {
    fn name(&self) -> &'static str {
        match self.mode {
            DetectionMode::Anticipation => "MaCrossoverAnticipation",
            DetectionMode::Proximity => "MaCrossoverProximity",
            DetectionMode::ExactCross => "MaCrossoverExactCross",
        }
    }

    fn required_history(&self) -> usize {
        // Two points with both averages defined.
        self.calculator.slow_period() + 1
    }

    fn assess(&self, symbol: &Symbol, raw: &[RawPricePoint]) -> Result<ScanResult> {
        // 1. Clean the raw series.
        let series = preprocess(symbol, raw, self.required_history())?;

        // 2. Compute both averages.
        let indicators = self.calculator.compute(&series)?;

        // 3. Classify the relationship between them.
        let classification = self.classifier.classify(&indicators)?;
        let (diff_t, diff_prev) = classification.diffs();
        let latest = classification.latest;
        let (fast_ma, slow_ma) = (latest.fast_ma.unwrap_or_default(), latest.slow_ma.unwrap_or_default());

        // 4. Measure and score.
        let proximity = self.scorer.measure(diff_t, diff_prev, slow_ma);
        let score = self.scorer.score_proximity(&proximity);

        tracing::debug!(
            symbol = %symbol,
            state = %classification.state,
            distance_pct = proximity.distance_pct,
            slope = proximity.slope,
            score,
            "Instrument assessed."
        );

        Ok(ScanResult {
            symbol: symbol.clone(),
            as_of: latest.date,
            last_close: series.last().close,
            fast_ma,
            slow_ma,
            distance_pct: proximity.distance_pct,
            velocity: proximity.velocity,
            slope: proximity.slope,
            projected_days_to_cross: proximity.projected_days_to_cross,
            state: classification.state,
            momentum: classification.momentum,
            pending_cross: proximity.direction,
            last_cross: classification.last_cross(),
            score,
        })
    }

    fn exclusion_reason(&self, result: &ScanResult) -> Option<SkipReason> {
        let crossed = result.state == CrossState::CrossedRecently;
        match self.mode {
            DetectionMode::Anticipation if crossed => Some(SkipReason::CrossedRecently),
            DetectionMode::Anticipation if result.velocity <= 0.0 => Some(SkipReason::NotConverging),
            DetectionMode::Anticipation | DetectionMode::Proximity => None,
            DetectionMode::ExactCross if crossed => None,
            DetectionMode::ExactCross => Some(SkipReason::NoRecentCross),
        }
    }
}
