//! Composite score math.
//!
//! Engagement = `min(100, 100 * items / items_for_max)` over present sources.
//! Trend: `delta = base - previous_base` where `base` is the weighted average
//! of the other dimensions; the breakdown carries `clamp(50 + delta / 2)`.
//! History records `base`, never the composite, so equal inputs give delta 0.
//! Composite = weighted average over present dimensions, weights renormalized
//! over the present set, one decimal.

use super::weights::{ScoringConfig, Weights};
use crate::model::{Breakdown, Dimension, SignalSet};

/// Score when nothing could be measured.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Output of `combine`: score plus the inputs insights are derived from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scored {
    pub score: f64,
    pub breakdown: Breakdown,
    pub trend_delta: Option<f64>,
    pub total_items: u32,
    /// Trend-free weighted average; what the score history records.
    /// `None` when nothing was measured.
    pub base: Option<f64>,
}

impl Scored {
    pub fn neutral() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            breakdown: Breakdown::default(),
            trend_delta: None,
            total_items: 0,
            base: None,
        }
    }
}

pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn clamp_score(x: f64) -> f64 {
    x.clamp(0.0, 100.0)
}

pub fn engagement(total_items: u32, items_for_max: u32) -> f64 {
    let denom = items_for_max.max(1) as f64;
    clamp_score(100.0 * total_items as f64 / denom)
}

/// Weighted mean of the present dimensions; `None` when no weight applies.
pub fn weighted_average(breakdown: &Breakdown, weights: &Weights) -> Option<f64> {
    let (sum, total_w) = Dimension::ALL
        .iter()
        .filter_map(|d| {
            let v = breakdown.get(*d)?;
            let w = weights.weight_for(*d);
            (w > 0.0 && v.is_finite()).then_some((v * w, w))
        })
        .fold((0.0, 0.0), |(s, tw), (vw, w)| (s + vw, tw + w));
    (total_w > 0.0).then(|| sum / total_w)
}

/// Combine fetcher signals and the previous recorded base into a breakdown
/// and composite score. No present signal: neutral score, empty breakdown.
pub fn combine(signals: &SignalSet, previous_base: Option<f64>, cfg: &ScoringConfig) -> Scored {
    if !signals.any_present() {
        return Scored::neutral();
    }

    let total_items = signals.total_items();
    let mut breakdown = Breakdown {
        news: signals.news.score,
        rss: signals.rss.score,
        social: signals.social.score,
        engagement: Some(round1(engagement(
            total_items,
            cfg.thresholds.engagement_items_for_max,
        ))),
        trend: None,
    };

    let base = weighted_average(&breakdown, &cfg.weights).unwrap_or(NEUTRAL_SCORE);
    let delta = previous_base.map(|p| base - p).unwrap_or(0.0);
    breakdown.trend = Some(round1(clamp_score(NEUTRAL_SCORE + delta / 2.0)));

    let score = weighted_average(&breakdown, &cfg.weights).unwrap_or(NEUTRAL_SCORE);

    Scored {
        score: clamp_score(round1(score)),
        breakdown,
        trend_delta: Some(round1(delta)),
        total_items,
        base: Some(base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SignalResult, SignalSource};

    fn set(news: Option<f64>, rss: Option<f64>, social: Option<f64>) -> SignalSet {
        let mk = |src, v: Option<f64>| match v {
            Some(s) => SignalResult::scored(src, s, 10),
            None => SignalResult::unavailable(src),
        };
        SignalSet::from_results(vec![
            mk(SignalSource::News, news),
            mk(SignalSource::Rss, rss),
            mk(SignalSource::Social, social),
        ])
    }

    #[test]
    fn all_absent_is_neutral() {
        let s = combine(&SignalSet::default(), Some(80.0), &ScoringConfig::default());
        assert_eq!(s.score, 50.0);
        assert!(s.breakdown.is_empty());
        assert_eq!(s.trend_delta, None);
    }

    #[test]
    fn weights_renormalize_over_present() {
        // rss 80 with 10 items → engagement 20; no history → trend 50
        let s = combine(&set(None, Some(80.0), None), None, &ScoringConfig::default());
        assert_eq!(s.breakdown.engagement, Some(20.0));
        assert_eq!(s.breakdown.trend, Some(50.0));
        assert_eq!(s.trend_delta, Some(0.0));
        // (80*.20 + 20*.15 + 50*.05) / .40 = 53.75
        assert_eq!(s.score, 53.8);
        assert_eq!(s.breakdown.news, None);
    }

    #[test]
    fn trend_follows_previous_score() {
        let cfg = ScoringConfig::default();
        let first = combine(&set(Some(70.0), Some(70.0), Some(70.0)), None, &cfg);
        // base = (70*.8 + 60*.15) / .95
        let base = (70.0 * 0.8 + 60.0 * 0.15) / 0.95;
        let second = combine(&set(Some(70.0), Some(70.0), Some(70.0)), Some(40.0), &cfg);
        assert_eq!(second.trend_delta, Some(round1(base - 40.0)));
        assert!(second.breakdown.trend.unwrap() > 50.0);
        assert!(second.score > first.score);
    }

    #[test]
    fn same_inputs_against_own_base_do_not_drift() {
        let cfg = ScoringConfig::default();
        let signals = set(Some(90.0), None, None);
        let first = combine(&signals, None, &cfg);
        let again = combine(&signals, first.base, &cfg);
        assert_eq!(again.trend_delta, Some(0.0));
        assert_eq!(again.breakdown.trend, Some(50.0));
        assert_eq!(again.score, first.score);
    }

    #[test]
    fn engagement_saturates() {
        assert_eq!(engagement(500, 50), 100.0);
        assert_eq!(engagement(25, 50), 50.0);
        assert_eq!(engagement(3, 0), 100.0);
    }
}
