// tests/common/mod.rs
//
// Shared test doubles: fetchers with fixed or gated output, summarizers
// that count, stream or blow up, and a builder for an aggregator on a
// manual clock.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures_util::stream;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use likability_analyzer::analyze::summarizer::{
    NarrativeStream, Summarizer, SummarizerError, SummaryFuture,
};
use likability_analyzer::analyze::{Aggregator, DynSummarizer, ScoringConfig};
use likability_analyzer::cache::{ManualClock, ScoreCache};
use likability_analyzer::fetch::{DynFetcher, SignalFetcher, SignalHub};
use likability_analyzer::model::{CompositeResult, SignalResult, SignalSource};
use likability_analyzer::subject::Subject;

pub const DAY: Duration = Duration::from_secs(86_400);

/// Returns whatever result it holds; counts calls.
pub struct StaticFetcher {
    source: SignalSource,
    result: Mutex<SignalResult>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(result: SignalResult) -> Arc<Self> {
        Arc::new(Self {
            source: result.source,
            result: Mutex::new(result),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn scored(source: SignalSource, score: f64, count: u32) -> Arc<Self> {
        Self::new(SignalResult::scored(source, score, count))
    }

    pub fn absent(source: SignalSource) -> Arc<Self> {
        Self::new(SignalResult::unavailable(source))
    }

    pub fn set(&self, result: SignalResult) {
        *self.result.lock() = result;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalFetcher for StaticFetcher {
    async fn fetch(&self, _subject: &Subject) -> SignalResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.lock().clone()
    }
    fn source(&self) -> SignalSource {
        self.source
    }
    fn name(&self) -> &'static str {
        "static"
    }
}

/// Blocks every fetch until the test opens the gate; counts calls.
pub struct GatedFetcher {
    gate: Semaphore,
    calls: AtomicUsize,
}

impl GatedFetcher {
    pub fn closed() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    /// Let every pending and future fetch through.
    pub fn open(&self) {
        self.gate.add_permits(1_024);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalFetcher for GatedFetcher {
    async fn fetch(&self, _subject: &Subject) -> SignalResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.gate.acquire().await {
            Ok(_permit) => SignalResult::scored(SignalSource::News, 60.0, 10),
            Err(_) => SignalResult::unavailable(SignalSource::News),
        }
    }
    fn source(&self) -> SignalSource {
        SignalSource::News
    }
    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Summarizer double: fixed text or a fixed failure, with call counters.
pub struct CountingSummarizer {
    fail: bool,
    narrate: bool,
    summaries: AtomicUsize,
    narratives: AtomicUsize,
}

impl CountingSummarizer {
    /// Summaries succeed; no narrative is produced.
    pub fn ok() -> Arc<Self> {
        Self::build(false, false)
    }

    /// Summaries and narratives succeed.
    pub fn chatty() -> Arc<Self> {
        Self::build(false, true)
    }

    /// Every call fails.
    pub fn failing() -> Arc<Self> {
        Self::build(true, false)
    }

    fn build(fail: bool, narrate: bool) -> Arc<Self> {
        Arc::new(Self {
            fail,
            narrate,
            summaries: AtomicUsize::new(0),
            narratives: AtomicUsize::new(0),
        })
    }

    pub fn summaries(&self) -> usize {
        self.summaries.load(Ordering::SeqCst)
    }

    pub fn narratives(&self) -> usize {
        self.narratives.load(Ordering::SeqCst)
    }
}

impl Summarizer for CountingSummarizer {
    fn summarize<'a>(&'a self, result: &'a CompositeResult) -> SummaryFuture<'a> {
        self.summaries.fetch_add(1, Ordering::SeqCst);
        let out = if self.fail {
            Err(SummarizerError::Http("status 503".into()))
        } else {
            Ok(format!("Summary for {}", result.name))
        };
        Box::pin(async move { out })
    }

    fn narrate<'a>(&'a self, _question: &'a str, results: &'a [CompositeResult]) -> SummaryFuture<'a> {
        self.narratives.fetch_add(1, Ordering::SeqCst);
        let out = if self.fail || !self.narrate {
            Err(SummarizerError::Disabled)
        } else {
            Ok(format!("Narrative over {} result(s)", results.len()))
        };
        Box::pin(async move { out })
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// Panics while summarizing `trigger`; anything else gets a fixed summary.
pub struct PanickingSummarizer {
    trigger: &'static str,
}

impl PanickingSummarizer {
    pub fn on(trigger: &'static str) -> Arc<Self> {
        Arc::new(Self { trigger })
    }
}

impl Summarizer for PanickingSummarizer {
    fn summarize<'a>(&'a self, result: &'a CompositeResult) -> SummaryFuture<'a> {
        if result.name == self.trigger {
            panic!("summarizer blew up on {}", result.name);
        }
        let out = format!("Summary for {}", result.name);
        Box::pin(async move { Ok(out) })
    }

    fn narrate<'a>(&'a self, _question: &'a str, _results: &'a [CompositeResult]) -> SummaryFuture<'a> {
        Box::pin(async { Err(SummarizerError::Disabled) })
    }

    fn provider_name(&self) -> &'static str {
        "panicking"
    }
}

/// Narrates in fixed pieces, then optionally fails mid-way.
pub struct PiecewiseSummarizer {
    pieces: Vec<&'static str>,
    fail_after: bool,
}

impl PiecewiseSummarizer {
    pub fn new(pieces: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            pieces,
            fail_after: false,
        })
    }

    pub fn failing_after(pieces: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            pieces,
            fail_after: true,
        })
    }
}

impl Summarizer for PiecewiseSummarizer {
    fn summarize<'a>(&'a self, _result: &'a CompositeResult) -> SummaryFuture<'a> {
        Box::pin(async { Err(SummarizerError::Disabled) })
    }

    fn narrate<'a>(&'a self, _question: &'a str, _results: &'a [CompositeResult]) -> SummaryFuture<'a> {
        let whole = self.pieces.concat();
        Box::pin(async move { Ok(whole) })
    }

    fn narrate_stream<'a>(
        &'a self,
        _question: &'a str,
        _results: &'a [CompositeResult],
    ) -> NarrativeStream<'a> {
        let mut items: Vec<Result<String, SummarizerError>> =
            self.pieces.iter().map(|p| Ok(p.to_string())).collect();
        if self.fail_after {
            items.push(Err(SummarizerError::Http("stream reset".into())));
            items.push(Ok("never delivered".into()));
        }
        Box::pin(stream::iter(items))
    }

    fn provider_name(&self) -> &'static str {
        "piecewise"
    }
}

pub fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

pub struct Harness {
    pub aggregator: Arc<Aggregator>,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<ScoreCache>,
}

pub fn harness(fetchers: Vec<DynFetcher>, summarizer: DynSummarizer) -> Harness {
    let clock = Arc::new(ManualClock::new(t0()));
    let cache = Arc::new(ScoreCache::with_clock(DAY, clock.clone()));
    let aggregator = Arc::new(Aggregator::new(
        cache.clone(),
        SignalHub::new(fetchers),
        summarizer,
        ScoringConfig::default(),
    ));
    Harness {
        aggregator,
        clock,
        cache,
    }
}

/// news 70 / rss 62 / social 55, ten items each.
pub fn three_sources() -> (Arc<StaticFetcher>, Arc<StaticFetcher>, Arc<StaticFetcher>) {
    (
        StaticFetcher::scored(SignalSource::News, 70.0, 10),
        StaticFetcher::scored(SignalSource::Rss, 62.0, 10),
        StaticFetcher::scored(SignalSource::Social, 55.0, 10),
    )
}

pub fn as_dyn(f: &Arc<StaticFetcher>) -> DynFetcher {
    f.clone()
}
