// In crates/core-types/src/error.rs

use chrono::NaiveDate;
use thiserror::Error;

use crate::report::SkipReason;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Insufficient history: {available} usable points, {required} required")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Degenerate series: slow moving average is zero at {date}")]
    DegenerateSeries { date: NaiveDate },

    #[error("Price data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid price series: {0}")]
    InvalidSeries(String),

    #[error("Scan was cancelled before completion")]
    Cancelled,
}

impl Error {
    /// Maps a per-instrument failure onto the diagnostics bucket it is tallied under.
    ///
    /// Returns `None` for errors that abort a whole scan rather than skip one instrument.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Error::InsufficientHistory { .. } => Some(SkipReason::InsufficientHistory),
            Error::DegenerateSeries { .. } => Some(SkipReason::DegenerateSeries),
            // A series the provider hands back malformed is as good as no series.
            Error::DataUnavailable(_) | Error::InvalidSeries(_) => Some(SkipReason::DataUnavailable),
            Error::Configuration(_) | Error::Cancelled => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
