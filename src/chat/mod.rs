// src/chat/mod.rs
//! Streaming session controller: one chat message in, an ordered finite
//! sequence of `StreamEvent`s out, always ending with exactly one `done`.

pub mod events;
pub mod intent;

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::analyze::{fallback_narrative, Aggregator};
use crate::model::{rank_by_score, CompositeResult, RankingEntry};

pub use events::StreamEvent;
pub use intent::{Action, Intent, IntentClassifier};

/// Bounded event channel capacity per turn.
pub const EVENT_BUFFER: usize = 32;

pub const HELP_TEXT: &str = "I score the public likability (0-100) of public figures from news, \
trending RSS headlines and social discussion.\n\n\
Try:\n\
- \"How is Modi doing?\"\n\
- \"What about Amit Shah?\"\n\
- \"Compare Rahul Gandhi and Narendra Modi\"\n\
- \"KTR vs Harish Rao vs Revanth Reddy\"\n\n\
Results are cached for 24 hours; ask again with refresh to recompute.";

pub const EMPTY_MESSAGE: &str = "Please type a question, for example \"How is Modi doing?\".";
pub const INTERNAL_ERROR: &str = "Sorry, something went wrong while analyzing. Please try again.";

#[derive(Debug)]
struct Disconnected;

/// Sending half of one turn. A dropped receiver ends the turn.
struct Emitter {
    tx: mpsc::Sender<StreamEvent>,
}

impl Emitter {
    async fn emit(&self, ev: StreamEvent) -> Result<(), Disconnected> {
        self.tx.send(ev).await.map_err(|_| Disconnected)
    }
}

pub struct ChatController {
    aggregator: Arc<Aggregator>,
    classifier: IntentClassifier,
}

impl ChatController {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            classifier: IntentClassifier::new(),
        }
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Start a turn. Events are produced by a spawned task; a panic inside it
    /// still yields a generic error `text` and the closing `done`.
    pub fn stream(self: &Arc<Self>, message: impl Into<String>, force_refresh: bool) -> EventStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let this = Arc::clone(self);
        let message = message.into();

        tokio::spawn(async move {
            let emitter = Emitter { tx: tx.clone() };
            let worker = tokio::spawn(async move { this.run(&message, force_refresh, &emitter).await });
            match worker.await {
                Ok(Ok(())) => {}
                Ok(Err(Disconnected)) => {
                    tracing::debug!(target: "likability::chat", "client went away, turn stopped");
                }
                Err(e) => {
                    tracing::error!(target: "likability::chat", error = %e, "chat turn aborted");
                    if tx.send(StreamEvent::text(INTERNAL_ERROR)).await.is_ok() {
                        let _ = tx.send(StreamEvent::Done).await;
                    }
                }
            }
        });

        EventStream { rx }
    }

    async fn run(&self, message: &str, force_refresh: bool, out: &Emitter) -> Result<(), Disconnected> {
        if message.trim().is_empty() {
            out.emit(StreamEvent::text(EMPTY_MESSAGE)).await?;
            return out.emit(StreamEvent::Done).await;
        }

        out.emit(StreamEvent::status("Thinking...")).await?;
        let intent = self.classifier.classify(message);
        tracing::info!(
            target: "likability::chat",
            action = intent.action.as_str(),
            subjects = intent.subjects.len(),
            refresh = force_refresh,
            "chat turn"
        );
        out.emit(StreamEvent::Intent {
            action: intent.action.as_str().to_string(),
            subjects: intent.subjects.clone(),
            response: intent.response.clone(),
        })
        .await?;

        match intent.action {
            Action::Help => out.emit(StreamEvent::text(HELP_TEXT)).await?,
            Action::Chat => out.emit(StreamEvent::text(intent.response.clone())).await?,
            Action::Analyze | Action::Compare => {
                if !self.analyze_subjects(message, &intent.subjects, force_refresh, out).await? {
                    out.emit(StreamEvent::text(INTERNAL_ERROR)).await?;
                }
            }
        }

        out.emit(StreamEvent::Done).await
    }

    /// Scores each subject in order. Returns `Ok(false)` when a subject failed
    /// and the remaining ones were skipped.
    async fn analyze_subjects(
        &self,
        message: &str,
        subjects: &[String],
        force_refresh: bool,
        out: &Emitter,
    ) -> Result<bool, Disconnected> {
        let mut results: Vec<CompositeResult> = Vec::with_capacity(subjects.len());
        for name in subjects {
            out.emit(StreamEvent::status(format!("Fetching data for {name}...")))
                .await?;
            match self.aggregator.compute(name, force_refresh).await {
                Ok(r) => {
                    out.emit(StreamEvent::score(r.clone())).await?;
                    results.push(r);
                }
                Err(e) => {
                    tracing::warn!(target: "likability::chat", error = %e, "subject failed");
                    return Ok(false);
                }
            }
        }

        // each narrative piece is its own `text` event, in arrival order
        let mut narrative = self.aggregator.summarizer().narrate_stream(message, &results);
        while let Some(piece) = narrative.next().await {
            match piece {
                Ok(text) if !text.is_empty() => out.emit(StreamEvent::text(text)).await?,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(target: "likability::chat", error = %e, "narrative ended early");
                    break;
                }
            }
        }

        if results.len() >= 2 {
            out.emit(StreamEvent::Rankings {
                data: rank_by_score(&results),
            })
            .await?;
        }
        Ok(true)
    }
}

/// Receiving half of one turn.
pub struct EventStream {
    rx: mpsc::Receiver<StreamEvent>,
}

impl EventStream {
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Drain the turn up to and including `done`.
    pub async fn collect(mut self) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        while let Some(ev) = self.rx.recv().await {
            let done = ev.is_done();
            out.push(ev);
            if done {
                break;
            }
        }
        out
    }

    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send + 'static {
        futures_util::stream::unfold(self.rx, |mut rx| async move {
            rx.recv().await.map(|ev| (ev, rx))
        })
    }
}

/// Non-streaming view of a whole turn, served by `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub action: String,
    pub initial_response: String,
    pub politicians: Vec<CompositeResult>,
    pub final_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rankings: Option<Vec<RankingEntry>>,
}

impl ChatResponse {
    pub fn from_events(events: Vec<StreamEvent>) -> Self {
        let mut resp = ChatResponse {
            action: Action::Chat.as_str().to_string(),
            initial_response: String::new(),
            politicians: Vec::new(),
            final_response: String::new(),
            rankings: None,
        };
        let mut texts: Vec<String> = Vec::new();
        for ev in events {
            match ev {
                StreamEvent::Intent { action, response, .. } => {
                    resp.action = action;
                    resp.initial_response = response;
                }
                StreamEvent::Score { politician } => resp.politicians.push(*politician),
                StreamEvent::Text { content } => texts.push(content),
                StreamEvent::Rankings { data } => resp.rankings = Some(data),
                StreamEvent::Status { .. } | StreamEvent::Done => {}
            }
        }
        // narrative pieces are fragments of one answer
        resp.final_response = if texts.is_empty() {
            fallback_narrative(&resp.politicians)
        } else {
            texts.concat()
        };
        resp
    }
}
