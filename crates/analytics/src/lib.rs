// In crates/analytics/src/lib.rs

pub mod ranking;
pub mod types;

// Re-export the most important types for easy access.
pub use ranking::{Ranking, RankingAggregator};
pub use types::{RankingSettings, SortKey};
