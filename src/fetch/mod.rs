// src/fetch/mod.rs
//! Signal fetchers. A `TextProvider` pulls raw headlines/posts from one
//! upstream; `LexiconFetcher` scores them into a `SignalResult`; `SignalHub`
//! runs every configured fetcher for a subject concurrently.

pub mod newsapi;
pub mod reddit;
pub mod rss;
pub mod text;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::join_all;
use metrics::{counter, histogram};

use crate::config::Settings;
use crate::model::{SignalResult, SignalSet, SignalSource};
use crate::sentiment::SentimentAnalyzer;
use crate::subject::Subject;

pub use text::normalize_text;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Produces one signal per subject. Never fails: an unreachable or
/// unconfigured upstream yields an absent signal.
#[async_trait]
pub trait SignalFetcher: Send + Sync {
    async fn fetch(&self, subject: &Subject) -> SignalResult;
    fn source(&self) -> SignalSource;
    fn name(&self) -> &'static str;
}

pub type DynFetcher = Arc<dyn SignalFetcher>;

/// Raw text collection from one upstream.
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn collect(&self, subject: &Subject) -> anyhow::Result<Vec<String>>;
    fn source(&self) -> SignalSource;
    fn name(&self) -> &'static str;
}

/// Scores a provider's texts with the lexicon analyzer.
pub struct LexiconFetcher<P> {
    provider: P,
    analyzer: SentimentAnalyzer,
}

impl<P: TextProvider> LexiconFetcher<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            analyzer: SentimentAnalyzer::new(),
        }
    }
}

#[async_trait]
impl<P: TextProvider> SignalFetcher for LexiconFetcher<P> {
    async fn fetch(&self, subject: &Subject) -> SignalResult {
        let source = self.provider.source();
        let t0 = Instant::now();
        let texts = match self.provider.collect(subject).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(
                    target: "likability::fetch",
                    provider = self.provider.name(),
                    subject_id = %subject.anon_id(),
                    error = %e,
                    "source unavailable"
                );
                counter!("likability_fetch_errors_total", "source" => source.as_str()).increment(1);
                return SignalResult::unavailable(source);
            }
        };
        histogram!("likability_fetch_ms", "source" => source.as_str())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);

        let tally = self.analyzer.tally(texts.iter().map(String::as_str));
        match tally.score() {
            Some(score) => {
                tracing::debug!(
                    target: "likability::fetch",
                    provider = self.provider.name(),
                    positive = tally.positive,
                    negative = tally.negative,
                    neutral = tally.neutral,
                    score,
                    "scored texts"
                );
                SignalResult::scored(source, score, tally.total())
            }
            None => SignalResult::unavailable(source),
        }
    }

    fn source(&self) -> SignalSource {
        self.provider.source()
    }

    fn name(&self) -> &'static str {
        self.provider.name()
    }
}

/// The set of fetchers consulted for every subject.
#[derive(Clone, Default)]
pub struct SignalHub {
    fetchers: Vec<DynFetcher>,
}

impl SignalHub {
    pub fn new(fetchers: Vec<DynFetcher>) -> Self {
        Self { fetchers }
    }

    /// No fetchers: every signal stays absent.
    pub fn empty() -> Self {
        Self::default()
    }

    /// RSS is always wired; news and social only with credentials.
    pub fn from_settings(settings: &Settings) -> Self {
        let client = http_client(&settings.reddit_user_agent);
        let sources = settings.sources();
        let mut fetchers: Vec<DynFetcher> = Vec::with_capacity(3);

        if sources.news_enabled {
            fetchers.push(Arc::new(LexiconFetcher::new(newsapi::NewsApiProvider::new(
                client.clone(),
                settings.newsapi_key.clone(),
            ))));
        }
        fetchers.push(Arc::new(LexiconFetcher::new(rss::GoogleNewsRss::from_client(
            client.clone(),
        ))));
        if sources.social_enabled {
            fetchers.push(Arc::new(LexiconFetcher::new(reddit::RedditProvider::new(
                client,
                settings.reddit_client_id.clone(),
                settings.reddit_client_secret.clone(),
            ))));
        }

        tracing::info!(
            target: "likability::fetch",
            news = sources.news_enabled,
            social = sources.social_enabled,
            rss = true,
            "signal sources wired"
        );
        Self { fetchers }
    }

    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }

    /// Run every fetcher concurrently and fold the results.
    pub async fn gather(&self, subject: &Subject) -> SignalSet {
        let results = join_all(self.fetchers.iter().map(|f| f.fetch(subject))).await;
        SignalSet::from_results(results)
    }
}

/// Shared HTTP client for all upstreams.
pub fn http_client(user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(user_agent.to_string())
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "http client builder failed, using defaults");
            reqwest::Client::new()
        })
}
