//! Summarizer: provider abstraction + daily call limit + templated fallbacks.
//! Narratives can be streamed; OpenAI deltas arrive as server-sent events.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Settings, SummarizerConfig};
use crate::model::{CompositeResult, Dimension};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const SYSTEM_PROMPT: &str = "You are a balanced political analyst. Explain public-sentiment \
likability data about Indian public figures in plain language. Use the numbers given, stay \
neutral, no emojis.";

const SUMMARY_MAX_CHARS: usize = 600;
const NARRATIVE_MAX_CHARS: usize = 2_000;
const SUMMARY_MAX_TOKENS: u32 = 200;
const NARRATIVE_MAX_TOKENS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizerError {
    #[error("summarizer disabled")]
    Disabled,
    #[error("summarizer http error: {0}")]
    Http(String),
    #[error("summarizer returned no text")]
    EmptyResponse,
    #[error("summarizer daily limit reached")]
    QuotaExceeded,
}

pub type SummaryFuture<'a> = Pin<Box<dyn Future<Output = Result<String, SummarizerError>> + Send + 'a>>;
/// Narrative pieces in order; concatenated they form the whole answer.
pub type NarrativeStream<'a> = Pin<Box<dyn Stream<Item = Result<String, SummarizerError>> + Send + 'a>>;

/// Natural-language collaborator of the aggregator and the chat controller.
pub trait Summarizer: Send + Sync {
    /// Short summary of one result's breakdown.
    fn summarize<'a>(&'a self, result: &'a CompositeResult) -> SummaryFuture<'a>;
    /// Conversational answer to `question` over one or more results.
    fn narrate<'a>(&'a self, question: &'a str, results: &'a [CompositeResult]) -> SummaryFuture<'a>;
    /// `narrate` delivered piecewise as the provider produces it. Providers
    /// without incremental output yield the whole narrative once.
    fn narrate_stream<'a>(
        &'a self,
        question: &'a str,
        results: &'a [CompositeResult],
    ) -> NarrativeStream<'a> {
        Box::pin(stream::once(self.narrate(question, results)))
    }
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

/// Factory.
///
/// * `AI_TEST_MODE=mock` → deterministic mock.
/// * disabled or no key → `DisabledSummarizer`.
/// * else OpenAI wrapped with the daily limit.
pub fn build_summarizer(settings: &Settings) -> DynSummarizer {
    if settings.ai_mock {
        return Arc::new(MockSummarizer);
    }
    let cfg = SummarizerConfig::resolve(settings);
    if !cfg.enabled || cfg.api_key.is_empty() {
        tracing::info!(target: "likability::summarizer", "summarizer disabled, templated summaries only");
        return Arc::new(DisabledSummarizer);
    }
    let provider = OpenAiSummarizer::new(
        cfg.api_key.clone(),
        cfg.model(),
        Duration::from_secs(cfg.timeout_secs),
    );
    Arc::new(LimitedSummarizer::new(provider, cfg.daily_limit))
}

// ------------------------------------------------------------
// Providers
// ------------------------------------------------------------

/// Always fails with `Disabled`; callers fall back to templates.
pub struct DisabledSummarizer;

impl Summarizer for DisabledSummarizer {
    fn summarize<'a>(&'a self, _result: &'a CompositeResult) -> SummaryFuture<'a> {
        Box::pin(async { Err(SummarizerError::Disabled) })
    }
    fn narrate<'a>(&'a self, _question: &'a str, _results: &'a [CompositeResult]) -> SummaryFuture<'a> {
        Box::pin(async { Err(SummarizerError::Disabled) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic output for tests and local runs.
pub struct MockSummarizer;

impl Summarizer for MockSummarizer {
    fn summarize<'a>(&'a self, result: &'a CompositeResult) -> SummaryFuture<'a> {
        let out = format!("{} scores {:.1}/100 (mock).", result.name, result.score);
        Box::pin(async move { Ok(out) })
    }
    fn narrate<'a>(&'a self, _question: &'a str, results: &'a [CompositeResult]) -> SummaryFuture<'a> {
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        let out = format!("Mock narrative for {}.", names.join(", "));
        Box::pin(async move { Ok(out) })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Serialize)]
struct ChatMsg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: [ChatMsg<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResp {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMsg,
}

#[derive(Deserialize, Default)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

/// One `data:` frame of a streamed completion.
#[derive(Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: ChoiceMsg,
}

type ByteStream = BoxStream<'static, reqwest::Result<Vec<u8>>>;

/// OpenAI Chat Completions.
pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            api_key,
            model: model.to_string(),
        }
    }

    async fn send(&self, user: &str, max_tokens: u32, stream: bool) -> Result<reqwest::Response, SummarizerError> {
        if self.api_key.is_empty() {
            return Err(SummarizerError::Disabled);
        }
        let req = ChatReq {
            model: &self.model,
            messages: [
                ChatMsg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMsg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.5,
            max_tokens,
            stream,
        };
        let resp = self
            .http
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| SummarizerError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(SummarizerError::Http(format!("status {}", resp.status())));
        }
        Ok(resp)
    }

    async fn complete(&self, user: String, max_tokens: u32, max_chars: usize) -> Result<String, SummarizerError> {
        let body: ChatResp = self
            .send(&user, max_tokens, false)
            .await?
            .json()
            .await
            .map_err(|e| SummarizerError::Http(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let cleaned = sanitize(&content, max_chars);
        if cleaned.is_empty() {
            Err(SummarizerError::EmptyResponse)
        } else {
            Ok(cleaned)
        }
    }

    async fn next_delta(&self, mut state: DeltaState) -> Option<(Result<String, SummarizerError>, DeltaState)> {
        loop {
            state = match state {
                DeltaState::Finished => return None,
                DeltaState::Connect(prompt) => {
                    match self.send(&prompt, NARRATIVE_MAX_TOKENS, true).await {
                        Ok(resp) => {
                            let body = resp.bytes_stream().map(|r| r.map(|b| b.to_vec())).boxed();
                            DeltaState::Read(Box::new(DeltaReader::new(body)))
                        }
                        Err(e) => return Some((Err(e), DeltaState::Finished)),
                    }
                }
                DeltaState::Read(mut r) => {
                    if let Some(piece) = r.take_piece() {
                        return Some((Ok(piece), DeltaState::Read(r)));
                    }
                    if r.done {
                        if r.remaining == NARRATIVE_MAX_CHARS {
                            return Some((Err(SummarizerError::EmptyResponse), DeltaState::Finished));
                        }
                        return None;
                    }
                    match r.body.next().await {
                        Some(Ok(bytes)) => {
                            r.buf.extend_from_slice(&bytes);
                            r.done = drain_sse_deltas(&mut r.buf, &mut r.pending);
                        }
                        Some(Err(e)) => {
                            return Some((Err(SummarizerError::Http(e.to_string())), DeltaState::Finished))
                        }
                        None => r.done = true,
                    }
                    DeltaState::Read(r)
                }
            };
        }
    }
}

enum DeltaState {
    Connect(String),
    Read(Box<DeltaReader>),
    Finished,
}

/// Buffered reader over a streamed completion body.
struct DeltaReader {
    body: ByteStream,
    buf: Vec<u8>,
    pending: VecDeque<String>,
    done: bool,
    /// Characters still allowed before the narrative is cut off.
    remaining: usize,
}

impl DeltaReader {
    fn new(body: ByteStream) -> Self {
        Self {
            body,
            buf: Vec::new(),
            pending: VecDeque::new(),
            done: false,
            remaining: NARRATIVE_MAX_CHARS,
        }
    }

    fn take_piece(&mut self) -> Option<String> {
        let piece = self.pending.pop_front()?;
        let n = piece.chars().count();
        if n < self.remaining {
            self.remaining -= n;
            return Some(piece);
        }
        let cut: String = piece.chars().take(self.remaining).collect();
        self.remaining = 0;
        self.pending.clear();
        self.done = true;
        if cut.is_empty() {
            None
        } else {
            Some(cut)
        }
    }
}

/// Move complete lines out of `buf` and queue the content deltas of
/// Chat Completions stream frames. Returns true once `data: [DONE]` is seen.
/// A trailing partial line stays in `buf` for the next chunk.
pub(crate) fn drain_sse_deltas(buf: &mut Vec<u8>, out: &mut VecDeque<String>) -> bool {
    while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buf.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&line);
        let Some(data) = line.trim().strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            return true;
        }
        match serde_json::from_str::<StreamFrame>(data) {
            Ok(frame) => {
                let text = frame.choices.into_iter().next().and_then(|c| c.delta.content);
                if let Some(text) = text.filter(|t| !t.is_empty()) {
                    out.push_back(text);
                }
            }
            Err(e) => tracing::debug!(target: "likability::summarizer", error = %e, "skipping stream frame"),
        }
    }
    false
}

fn narrative_prompt(question: &str, results: &[CompositeResult]) -> String {
    let data = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("#{} {}", i + 1, format_for_prompt(r)))
        .collect::<Vec<_>>()
        .join("\n\n");
    let task = if results.len() > 1 {
        "Compare these figures, name who leads and why, and point out notable differences."
    } else {
        "Answer conversationally: summarize key findings and insights using the numbers."
    };
    format!("{task} Keep it to 2-3 short paragraphs.\n\nAnalysis data:\n{data}\n\nUser's question: {question}")
}

impl Summarizer for OpenAiSummarizer {
    fn summarize<'a>(&'a self, result: &'a CompositeResult) -> SummaryFuture<'a> {
        let prompt = format!(
            "Summarize this likability analysis in 2-3 sentences.\n\n{}",
            format_for_prompt(result)
        );
        Box::pin(self.complete(prompt, SUMMARY_MAX_TOKENS, SUMMARY_MAX_CHARS))
    }

    fn narrate<'a>(&'a self, question: &'a str, results: &'a [CompositeResult]) -> SummaryFuture<'a> {
        let prompt = narrative_prompt(question, results);
        Box::pin(self.complete(prompt, NARRATIVE_MAX_TOKENS, NARRATIVE_MAX_CHARS))
    }

    fn narrate_stream<'a>(
        &'a self,
        question: &'a str,
        results: &'a [CompositeResult],
    ) -> NarrativeStream<'a> {
        let start = DeltaState::Connect(narrative_prompt(question, results));
        Box::pin(stream::unfold(start, move |state| self.next_delta(state)))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Daily limit wrapper
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct DailyCounter {
    day: i64,
    count: u32,
}

fn today() -> i64 {
    chrono::Utc::now().timestamp().div_euclid(86_400)
}

/// Caps real provider calls per UTC day. A call reserves its slot before it
/// starts and hands it back if it fails, so concurrent callers cannot overrun
/// the limit.
pub struct LimitedSummarizer<S> {
    inner: S,
    daily_limit: u32,
    counter: Mutex<DailyCounter>,
}

impl<S: Summarizer> LimitedSummarizer<S> {
    pub fn new(inner: S, daily_limit: u32) -> Self {
        Self {
            inner,
            daily_limit,
            counter: Mutex::new(DailyCounter { day: today(), count: 0 }),
        }
    }

    /// Reserve one of today's calls; false once the quota is spent.
    fn try_acquire(&self) -> bool {
        let mut g = self.counter.lock().expect("summarizer counter poisoned");
        let now = today();
        if g.day != now {
            *g = DailyCounter { day: now, count: 0 };
        }
        if g.count >= self.daily_limit {
            return false;
        }
        g.count += 1;
        true
    }

    /// Return a reservation whose call failed. A slot taken before midnight
    /// is not credited to the new day.
    fn release(&self) {
        let mut g = self.counter.lock().expect("summarizer counter poisoned");
        if g.day == today() {
            g.count = g.count.saturating_sub(1);
        }
    }

    pub fn used_today(&self) -> u32 {
        let g = self.counter.lock().expect("summarizer counter poisoned");
        if g.day == today() {
            g.count
        } else {
            0
        }
    }
}

impl<S: Summarizer> Summarizer for LimitedSummarizer<S> {
    fn summarize<'a>(&'a self, result: &'a CompositeResult) -> SummaryFuture<'a> {
        Box::pin(async move {
            if !self.try_acquire() {
                return Err(SummarizerError::QuotaExceeded);
            }
            let out = self.inner.summarize(result).await;
            if out.is_err() {
                self.release();
            }
            out
        })
    }

    fn narrate<'a>(&'a self, question: &'a str, results: &'a [CompositeResult]) -> SummaryFuture<'a> {
        Box::pin(async move {
            if !self.try_acquire() {
                return Err(SummarizerError::QuotaExceeded);
            }
            let out = self.inner.narrate(question, results).await;
            if out.is_err() {
                self.release();
            }
            out
        })
    }

    fn narrate_stream<'a>(
        &'a self,
        question: &'a str,
        results: &'a [CompositeResult],
    ) -> NarrativeStream<'a> {
        if !self.try_acquire() {
            return Box::pin(stream::once(async { Err(SummarizerError::QuotaExceeded) }));
        }
        // the first item decides: an error before any text frees the slot
        let mut settled = false;
        Box::pin(self.inner.narrate_stream(question, results).inspect(move |item| {
            if !settled {
                settled = true;
                if item.is_err() {
                    self.release();
                }
            }
        }))
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

// ------------------------------------------------------------
// Prompt data and fallbacks
// ------------------------------------------------------------

fn fmt_value(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{x:.1}/100"),
        None => "n/a".to_string(),
    }
}

/// Plain-text block describing one result.
pub fn format_for_prompt(r: &CompositeResult) -> String {
    let mut out = format!("{}: likability score {:.1}/100\n", r.name, r.score);
    for dim in Dimension::ALL {
        out.push_str(&format!("- {}: {}\n", dim.label(), fmt_value(r.breakdown.get(dim))));
    }
    out.push_str(&format!(
        "Items analyzed: news {}, rss {}, social {}\n",
        r.sources.news, r.sources.rss, r.sources.social
    ));
    if !r.insights.is_empty() {
        out.push_str(&format!("Strengths: {}\n", r.insights.join("; ")));
    }
    if !r.weaknesses.is_empty() {
        out.push_str(&format!("Weaknesses: {}\n", r.weaknesses.join("; ")));
    }
    out
}

fn tone(score: f64) -> &'static str {
    match score {
        s if s >= 65.0 => "favorable",
        s if s >= 45.0 => "mixed",
        _ => "unfavorable",
    }
}

/// Templated summary used when the summarizer is unavailable. Never empty.
pub fn fallback_summary(r: &CompositeResult) -> String {
    if r.breakdown.is_empty() {
        return format!(
            "{} has a neutral likability score of {:.1}/100; no source returned data.",
            r.name, r.score
        );
    }
    let parts: Vec<String> = [Dimension::News, Dimension::Rss, Dimension::Social]
        .iter()
        .filter_map(|d| r.breakdown.get(*d).map(|v| format!("{} {:.1}", d.label().to_lowercase(), v)))
        .collect();
    let mut out = format!(
        "{} has a {} likability score of {:.1}/100",
        r.name,
        tone(r.score),
        r.score
    );
    if !parts.is_empty() {
        out.push_str(&format!(" ({})", parts.join(", ")));
    }
    out.push('.');
    out
}

/// Templated narrative for a turn. Used by non-streaming surfaces.
pub fn fallback_narrative(results: &[CompositeResult]) -> String {
    match results {
        [] => String::new(),
        [one] => fallback_summary(one),
        many => {
            let mut sorted: Vec<&CompositeResult> = many.iter().collect();
            sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
            let lines: Vec<String> = sorted
                .iter()
                .map(|r| format!("{} {:.1}/100", r.name, r.score))
                .collect();
            format!("{} leads: {}.", sorted[0].name, lines.join(", "))
        }
    }
}

/// Collapse whitespace runs (newlines kept as paragraph breaks), cap length.
pub fn sanitize(input: &str, max_chars: usize) -> String {
    let paragraphs: Vec<String> = input
        .split("\n\n")
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect();
    let joined = paragraphs.join("\n\n");
    if joined.chars().count() > max_chars {
        joined.chars().take(max_chars).collect::<String>().trim_end().to_string()
    } else {
        joined
    }
}
