use core_types::Result;

use crate::ma_crossover::MaCrossoverDetector;
use crate::types::DetectionSettings;
use crate::Detector;

/// Builds the configured detector, rejecting invalid settings before any scan starts.
pub fn create_detector(settings: &DetectionSettings) -> Result<Box<dyn Detector>> {
    settings.validate()?;
    let detector = MaCrossoverDetector::new(settings)?;
    tracing::info!(
        detector = detector.name(),
        fast = settings.fast_period,
        slow = settings.slow_period,
        ma_kind = %settings.ma_kind,
        threshold_pct = settings.threshold_pct,
        "Detector created."
    );
    Ok(Box::new(detector))
}
