// In crates/strategies/src/lib.rs

use core_types::{RawPricePoint, Result, ScanResult, SkipReason, Symbol};

pub mod classifier;
pub mod factory;
pub mod ma_crossover;
pub mod moving_average;
pub mod preprocess;
pub mod scorer;
pub mod types;

pub use factory::create_detector;
pub use types::{DetectionMode, DetectionSettings, ScoringSettings};

/// The universal interface for a crossover detector.
///
/// A detector turns one instrument's raw price history into a scored `ScanResult`
/// and decides whether that result belongs in the report for its detection mode.
/// Detectors hold only read-only configuration, so one instance is shared by every
/// worker in a scan.
pub trait Detector: Send + Sync {
    /// The name of the detector.
    fn name(&self) -> &'static str;

    /// Minimum number of clean closes needed to evaluate an instrument.
    fn required_history(&self) -> usize;

    /// Evaluates a single instrument.
    ///
    /// # Returns
    ///
    /// * `Err(Error::InsufficientHistory)` if the cleaned series is too short.
    /// * `Err(Error::DegenerateSeries)` if the slow average is zero.
    fn assess(&self, symbol: &Symbol, raw: &[RawPricePoint]) -> Result<ScanResult>;

    /// Why `result` is excluded by this detector's mode, or `None` if it is admitted.
    fn exclusion_reason(&self, result: &ScanResult) -> Option<SkipReason>;
}
