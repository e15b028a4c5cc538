// In crates/analytics/src/types.rs

use core_types::{Error, Result};
use serde::{Deserialize, Serialize};

/// What the ranked report is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Highest score first.
    #[default]
    Score,
    /// Closest averages first.
    Distance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingSettings {
    /// Drop results whose `distance_pct` exceeds the threshold.
    #[serde(default = "default_threshold_enabled")]
    pub threshold_enabled: bool,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub sort_by: SortKey,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            threshold_enabled: default_threshold_enabled(),
            top_n: default_top_n(),
            sort_by: SortKey::default(),
        }
    }
}

impl RankingSettings {
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::Configuration("top_n must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn default_threshold_enabled() -> bool { true }
fn default_top_n() -> usize { 25 }
