//! Weight table and insight thresholds, overridable from `config/likability.toml`.
//!
//! TOML shape (every key optional):
//! ```toml
//! [weights]
//! news = 0.35
//! social = 0.25
//! rss = 0.20
//! engagement = 0.15
//! trend = 0.05
//!
//! [thresholds]
//! favorable = 65.0
//! unfavorable = 40.0
//! ```

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::model::Dimension;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub news: f64,
    pub social: f64,
    pub rss: f64,
    pub engagement: f64,
    pub trend: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            news: 0.35,
            social: 0.25,
            rss: 0.20,
            engagement: 0.15,
            trend: 0.05,
        }
    }
}

impl Weights {
    pub fn weight_for(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::News => self.news,
            Dimension::Social => self.social,
            Dimension::Rss => self.rss,
            Dimension::Engagement => self.engagement,
            Dimension::Trend => self.trend,
        }
    }

    /// Finite, non-negative and not all zero.
    pub fn is_valid(&self) -> bool {
        let all: Vec<f64> = Dimension::ALL.iter().map(|d| self.weight_for(*d)).collect();
        all.iter().all(|w| w.is_finite() && *w >= 0.0) && all.iter().sum::<f64>() > 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Sentiment dimension at or above this is a strength.
    pub favorable: f64,
    /// Sentiment dimension at or below this is a weakness.
    pub unfavorable: f64,
    pub engagement_high: f64,
    pub engagement_low: f64,
    /// Absolute trend delta that counts as a movement.
    pub trend_delta: f64,
    /// Fewer items than this: "limited data".
    pub limited_items: u32,
    /// More items than this: "comprehensive data".
    pub comprehensive_items: u32,
    /// Item count at which engagement saturates at 100.
    pub engagement_items_for_max: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            favorable: 65.0,
            unfavorable: 40.0,
            engagement_high: 70.0,
            engagement_low: 35.0,
            trend_delta: 10.0,
            limited_items: 10,
            comprehensive_items: 50,
            engagement_items_for_max: 50,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: Weights,
    pub thresholds: Thresholds,
}

impl ScoringConfig {
    /// Parse a TOML file. Invalid weights fall back to the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        let mut cfg: ScoringConfig = toml::from_str(&raw)?;
        if !cfg.weights.is_valid() {
            tracing::warn!(path = %path.display(), "invalid weight table, using defaults");
            cfg.weights = Weights::default();
        }
        if cfg.thresholds.engagement_items_for_max == 0 {
            cfg.thresholds.engagement_items_for_max = Thresholds::default().engagement_items_for_max;
        }
        Ok(cfg)
    }

    /// Missing or unreadable file → defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "scoring config unreadable, using defaults");
                Self::default()
            }
        }
    }
}
