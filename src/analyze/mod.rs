// src/analyze/mod.rs
//! Score aggregation entry: cache lookup, signal gathering, scoring,
//! insights, summary, history and cache write-back. A background sweep evicts
//! expired cache entries and idle history.

pub mod insights;
pub mod scoring;
pub mod summarizer;
pub mod weights;

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use tokio::task::JoinHandle;

use crate::cache::ScoreCache;
use crate::error::Result;
use crate::fetch::SignalHub;
use crate::history::ScoreHistory;
use crate::model::{CompositeResult, SignalSet, SourceCounts};
use crate::subject::Subject;

pub use crate::analyze::insights::assess;
pub use crate::analyze::scoring::{combine, Scored, NEUTRAL_SCORE};
pub use crate::analyze::summarizer::{
    build_summarizer, fallback_narrative, fallback_summary, DynSummarizer, Summarizer,
    SummarizerError,
};
pub use crate::analyze::weights::{ScoringConfig, Thresholds, Weights};

/// Subjects not computed for this long lose their trend history.
pub const HISTORY_RETENTION_DAYS: i64 = 30;
pub const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(600);

/// What one maintenance sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sweep {
    pub expired_entries: usize,
    pub idle_subjects: usize,
}

/// Combines fetchers, cache, history and summarizer into `compute`.
pub struct Aggregator {
    cache: Arc<ScoreCache>,
    hub: SignalHub,
    summarizer: DynSummarizer,
    history: ScoreHistory,
    config: ScoringConfig,
}

impl Aggregator {
    pub fn new(
        cache: Arc<ScoreCache>,
        hub: SignalHub,
        summarizer: DynSummarizer,
        config: ScoringConfig,
    ) -> Self {
        Self {
            cache,
            hub,
            summarizer,
            history: ScoreHistory::default(),
            config,
        }
    }

    pub fn cache(&self) -> &Arc<ScoreCache> {
        &self.cache
    }

    pub fn summarizer(&self) -> &DynSummarizer {
        &self.summarizer
    }

    pub fn history(&self) -> &ScoreHistory {
        &self.history
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Validate the raw name, then `compute_subject`.
    pub async fn compute(&self, raw: &str, force_refresh: bool) -> Result<CompositeResult> {
        let subject = Subject::parse(raw)?;
        Ok(self.compute_subject(&subject, force_refresh).await)
    }

    /// Cached result when live (and not forced), else a fresh computation
    /// that is recorded in history and cached.
    pub async fn compute_subject(&self, subject: &Subject, force_refresh: bool) -> CompositeResult {
        if !force_refresh {
            if let Some(mut hit) = self.cache.get(subject) {
                tracing::debug!(target: "likability::analyze", subject_id = %subject.anon_id(), "cache hit");
                hit.cached = true;
                return hit;
            }
        }

        let t0 = Instant::now();
        let signals = self.hub.gather(subject).await;
        let scored = self.evaluate(subject, &signals);
        let result = self.finish(subject, &signals, &scored).await;

        // an all-absent run measured nothing and must not anchor the next trend
        if let Some(base) = scored.base {
            self.history.push(subject, base, result.computed_at);
        }
        self.cache.set(subject, result.clone());

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("likability_compute_ms").record(ms);
        tracing::info!(
            target: "likability::analyze",
            subject_id = %subject.anon_id(),
            score = result.score,
            present = signals.any_present(),
            items = signals.total_items(),
            refresh = force_refresh,
            ms,
            "computed likability"
        );
        result
    }

    /// Pure scoring plus summary; no cache or history writes.
    pub async fn score(&self, subject: &Subject, signals: &SignalSet) -> CompositeResult {
        let scored = self.evaluate(subject, signals);
        self.finish(subject, signals, &scored).await
    }

    fn evaluate(&self, subject: &Subject, signals: &SignalSet) -> Scored {
        combine(signals, self.history.last_score(subject), &self.config)
    }

    async fn finish(
        &self,
        subject: &Subject,
        signals: &SignalSet,
        scored: &Scored,
    ) -> CompositeResult {
        let (insights, weaknesses) = assess(scored, &self.config.thresholds);

        let mut result = CompositeResult {
            subject: subject.key().to_string(),
            name: subject.display().to_string(),
            score: scored.score,
            breakdown: scored.breakdown,
            trend_delta: scored.trend_delta,
            sources: SourceCounts::from(signals),
            insights,
            weaknesses,
            summary: String::new(),
            cached: false,
            computed_at: self.cache.now(),
        };

        result.summary = match self.summarizer.summarize(&result).await {
            Ok(s) if !s.trim().is_empty() => s,
            Ok(_) => self.fallback(&result, &SummarizerError::EmptyResponse),
            Err(e) => self.fallback(&result, &e),
        };
        result
    }

    /// Evict expired cache entries and forget subjects idle past the
    /// history retention window.
    pub fn sweep(&self) -> Sweep {
        let expired_entries = self.cache.cleanup_expired();
        let cutoff = self.cache.now() - chrono::Duration::days(HISTORY_RETENTION_DAYS);
        let idle_subjects = self.history.prune_before(cutoff);
        gauge!("likability_history_subjects").set(self.history.subject_count() as f64);
        Sweep {
            expired_entries,
            idle_subjects,
        }
    }

    /// Run `sweep` every `every` until the aggregator is dropped.
    pub fn spawn_maintenance(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(this) = weak.upgrade() else { break };
                let sweep = this.sweep();
                tracing::debug!(
                    target: "likability::analyze",
                    expired = sweep.expired_entries,
                    idle = sweep.idle_subjects,
                    "maintenance sweep"
                );
            }
        })
    }

    fn fallback(&self, result: &CompositeResult, err: &SummarizerError) -> String {
        if !matches!(err, SummarizerError::Disabled) {
            tracing::warn!(
                target: "likability::analyze",
                provider = self.summarizer.provider_name(),
                error = %err,
                "summarizer failed, using template"
            );
        }
        counter!("likability_summarizer_fallback_total").increment(1);
        fallback_summary(result)
    }
}
