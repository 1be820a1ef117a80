use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::StreamExt;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::analyze::{build_summarizer, Aggregator, ScoringConfig};
use crate::cache::{CacheStats, ScoreCache};
use crate::chat::{ChatController, ChatResponse, StreamEvent};
use crate::config::{ConfigStatus, Settings};
use crate::error::LikabilityError;
use crate::fetch::SignalHub;
use crate::model::CompositeResult;

#[derive(Clone)]
pub struct AppState {
    controller: Arc<ChatController>,
    status: ConfigStatus,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(controller: Arc<ChatController>, status: ConfigStatus) -> Self {
        Self {
            controller,
            status,
            metrics: None,
        }
    }

    /// Wire cache, fetchers, summarizer and controller from settings.
    pub fn from_settings(settings: &Settings, scoring: ScoringConfig) -> Self {
        let cache = Arc::new(ScoreCache::new(settings.cache_ttl));
        let aggregator = Arc::new(Aggregator::new(
            cache,
            SignalHub::from_settings(settings),
            build_summarizer(settings),
            scoring,
        ));
        Self::new(Arc::new(ChatController::new(aggregator)), settings.status())
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn controller(&self) -> &Arc<ChatController> {
        &self.controller
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        self.controller.aggregator()
    }
}

pub fn router(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/config", get(config_status))
        .route("/api/chat", post(chat))
        .route("/api/chat/stream", post(chat_stream))
        .route("/api/analyze/{name}", get(analyze))
        .route("/api/cache/stats", get(cache_stats))
        .route("/api/cache/clear", post(cache_clear))
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    match metrics {
        Some(handle) => app.merge(crate::metrics::router(handle)),
        None => app,
    }
}

/// Maps the domain error onto an HTTP status and a JSON body.
pub struct ApiError(LikabilityError);

impl From<LikabilityError> for ApiError {
    fn from(e: LikabilityError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            LikabilityError::InvalidSubject => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": LikabilityError::InvalidSubject.to_string()})),
            )
                .into_response(),
            LikabilityError::Internal(detail) => {
                tracing::error!(target: "likability::api", %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Internal error"})),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    refresh: bool,
}

async fn config_status(State(state): State<AppState>) -> Json<ConfigStatus> {
    Json(state.status)
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "No message provided"})),
        )
            .into_response();
    }
    tracing::debug!(target: "likability::api", session = req.session_id.as_deref().unwrap_or("-"), "chat");
    let events = state.controller.stream(req.message, req.refresh).collect().await;
    Json(ChatResponse::from_events(events)).into_response()
}

async fn chat_stream(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> impl IntoResponse {
    tracing::debug!(target: "likability::api", session = req.session_id.as_deref().unwrap_or("-"), "chat stream");
    let events = state.controller.stream(req.message, req.refresh).into_stream();
    let frames = events.map(|ev: StreamEvent| {
        let frame = Event::default().json_data(&ev).unwrap_or_else(|e| {
            tracing::warn!(target: "likability::api", error = %e, kind = ev.kind(), "event not serializable");
            Event::default().data(r#"{"type":"text","content":"Internal error"}"#)
        });
        Ok::<_, Infallible>(frame)
    });

    (
        [
            (HeaderName::from_static("x-accel-buffering"), "no"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Sse::new(frames).keep_alive(KeepAlive::default()),
    )
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeQuery {
    #[serde(default)]
    refresh: bool,
}

async fn analyze(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<AnalyzeQuery>,
) -> Result<Json<CompositeResult>, ApiError> {
    // run on its own task so a panic in scoring answers 500 instead of
    // tearing down the connection
    let aggregator = Arc::clone(state.aggregator());
    let result = tokio::spawn(async move { aggregator.compute(&name, q.refresh).await })
        .await
        .map_err(|e| LikabilityError::Internal(format!("analyze task failed: {e}")))??;
    Ok(Json(result))
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.aggregator().cache().stats())
}

async fn cache_clear(State(state): State<AppState>) -> Json<serde_json::Value> {
    let cleared = state.aggregator().cache().clear();
    tracing::info!(target: "likability::api", cleared, "cache cleared");
    Json(json!({ "cleared": cleared }))
}
