//! Strengths and weaknesses derived from a scored breakdown by fixed thresholds.

use super::scoring::Scored;
use super::weights::Thresholds;
use crate::model::Dimension;

/// Phrase pair per sentiment dimension: (strength, weakness).
fn phrases(dim: Dimension) -> Option<(&'static str, &'static str)> {
    match dim {
        Dimension::News => Some(("Favorable news media coverage", "Negative news media portrayal")),
        Dimension::Rss => Some(("Positive trending news", "Negative trending coverage")),
        Dimension::Social => Some((
            "Strong support on social platforms",
            "Negative social media sentiment",
        )),
        Dimension::Engagement | Dimension::Trend => None,
    }
}

/// Returns `(insights, weaknesses)`. Deterministic for equal input; both
/// empty when nothing was measured.
pub fn assess(scored: &Scored, t: &Thresholds) -> (Vec<String>, Vec<String>) {
    let mut insights = Vec::new();
    let mut weaknesses = Vec::new();
    if scored.breakdown.is_empty() {
        return (insights, weaknesses);
    }
    let b = &scored.breakdown;

    for dim in [Dimension::News, Dimension::Rss, Dimension::Social] {
        let (Some(v), Some((good, bad))) = (b.get(dim), phrases(dim)) else {
            continue;
        };
        if v >= t.favorable {
            insights.push(good.to_string());
        } else if v <= t.unfavorable {
            weaknesses.push(bad.to_string());
        }
    }

    if let Some(e) = b.engagement {
        if e >= t.engagement_high {
            insights.push("High public engagement and discussion".to_string());
        } else if e <= t.engagement_low {
            weaknesses.push("Low public engagement".to_string());
        }
    }

    if let Some(delta) = scored.trend_delta {
        if delta >= t.trend_delta {
            insights.push("Improving public perception trend".to_string());
        } else if delta <= -t.trend_delta {
            weaknesses.push("Declining public perception".to_string());
        }
    }

    if scored.total_items < t.limited_items {
        weaknesses.push("Limited data available for analysis".to_string());
    } else if scored.total_items > t.comprehensive_items {
        insights.push("Comprehensive data coverage".to_string());
    }

    if scored.score >= t.favorable {
        insights.push("Favorable coverage overall".to_string());
    }

    (insights, weaknesses)
}
