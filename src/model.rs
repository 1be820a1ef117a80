// src/model.rs
//! Core data model: per-source signals, the score breakdown and the composite
//! result that is cached, streamed and printed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream data source a signal comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    News,
    Rss,
    Social,
}

impl SignalSource {
    pub const ALL: [SignalSource; 3] = [SignalSource::News, SignalSource::Rss, SignalSource::Social];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::News => "news",
            SignalSource::Rss => "rss",
            SignalSource::Social => "social",
        }
    }
}

/// One fetcher's output. `score == None` means "could not be queried or found
/// nothing" and is never treated as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub source: SignalSource,
    pub score: Option<f64>,
    pub raw_count: u32,
}

impl SignalResult {
    pub fn unavailable(source: SignalSource) -> Self {
        Self {
            source,
            score: None,
            raw_count: 0,
        }
    }

    /// Present signal; the score is clamped into [0,100].
    pub fn scored(source: SignalSource, score: f64, raw_count: u32) -> Self {
        let score = if score.is_finite() {
            Some(score.clamp(0.0, 100.0))
        } else {
            None
        };
        Self {
            source,
            score,
            raw_count,
        }
    }

    pub fn is_present(&self) -> bool {
        self.score.is_some()
    }
}

/// The three fetcher outputs for one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    pub news: SignalResult,
    pub rss: SignalResult,
    pub social: SignalResult,
}

impl Default for SignalSet {
    fn default() -> Self {
        Self {
            news: SignalResult::unavailable(SignalSource::News),
            rss: SignalResult::unavailable(SignalSource::Rss),
            social: SignalResult::unavailable(SignalSource::Social),
        }
    }
}

impl SignalSet {
    /// Build from fetcher results. Missing sources stay unavailable; when a
    /// source is reported twice, a present result wins over an absent one.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = SignalResult>,
    {
        let mut set = Self::default();
        for r in results {
            let slot = set.slot_mut(r.source);
            if !slot.is_present() || r.is_present() {
                *slot = r;
            }
        }
        set
    }

    pub fn get(&self, source: SignalSource) -> &SignalResult {
        match source {
            SignalSource::News => &self.news,
            SignalSource::Rss => &self.rss,
            SignalSource::Social => &self.social,
        }
    }

    fn slot_mut(&mut self, source: SignalSource) -> &mut SignalResult {
        match source {
            SignalSource::News => &mut self.news,
            SignalSource::Rss => &mut self.rss,
            SignalSource::Social => &mut self.social,
        }
    }

    pub fn any_present(&self) -> bool {
        SignalSource::ALL.iter().any(|s| self.get(*s).is_present())
    }

    /// Items collected across present sources only.
    pub fn total_items(&self) -> u32 {
        SignalSource::ALL
            .iter()
            .map(|s| self.get(*s))
            .filter(|r| r.is_present())
            .map(|r| r.raw_count)
            .sum()
    }
}

/// Named dimensions of the breakdown, in weight-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    News,
    Social,
    Rss,
    Engagement,
    Trend,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::News,
        Dimension::Social,
        Dimension::Rss,
        Dimension::Engagement,
        Dimension::Trend,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::News => "News sentiment",
            Dimension::Social => "Social sentiment",
            Dimension::Rss => "Trending news (RSS)",
            Dimension::Engagement => "Engagement",
            Dimension::Trend => "Trend",
        }
    }
}

/// Per-dimension values in [0,100]; `None` serializes as `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub news: Option<f64>,
    pub rss: Option<f64>,
    pub social: Option<f64>,
    pub engagement: Option<f64>,
    pub trend: Option<f64>,
}

impl Breakdown {
    pub fn get(&self, dim: Dimension) -> Option<f64> {
        match dim {
            Dimension::News => self.news,
            Dimension::Social => self.social,
            Dimension::Rss => self.rss,
            Dimension::Engagement => self.engagement,
            Dimension::Trend => self.trend,
        }
    }

    /// True when every dimension is absent.
    pub fn is_empty(&self) -> bool {
        Dimension::ALL.iter().all(|d| self.get(*d).is_none())
    }
}

/// Items collected per source (zero for absent sources).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub news: u32,
    pub rss: u32,
    pub social: u32,
}

impl From<&SignalSet> for SourceCounts {
    fn from(set: &SignalSet) -> Self {
        Self {
            news: set.news.raw_count,
            rss: set.rss.raw_count,
            social: set.social.raw_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    /// Normalized subject key.
    pub subject: String,
    /// Display name as requested.
    pub name: String,
    pub score: f64,
    pub breakdown: Breakdown,
    /// Signed change vs. the previous score for this subject.
    pub trend_delta: Option<f64>,
    pub sources: SourceCounts,
    pub insights: Vec<String>,
    pub weaknesses: Vec<String>,
    pub summary: String,
    pub cached: bool,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: usize,
    pub name: String,
    pub score: f64,
}

/// Stable descending sort by score; ties keep input order. Ranks start at 1.
pub fn rank_by_score(results: &[CompositeResult]) -> Vec<RankingEntry> {
    let mut order: Vec<&CompositeResult> = results.iter().collect();
    order.sort_by(|a, b| b.score.total_cmp(&a.score));
    order
        .into_iter()
        .enumerate()
        .map(|(i, r)| RankingEntry {
            rank: i + 1,
            name: r.name.clone(),
            score: r.score,
        })
        .collect()
}
