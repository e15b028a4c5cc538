// In crates/core-types/src/lib.rs

pub mod error;
pub mod report;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, Result};
pub use report::{ScanDiagnostics, ScanOutcome, ScanReport, ScanResult, SkipReason};
pub use types::{
    CrossEvent, CrossKind, CrossState, IndicatorPoint, IndicatorSeries, MaKind, Momentum,
    PricePoint, PriceSeries, RawPricePoint, Symbol,
};
