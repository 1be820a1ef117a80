// src/lib.rs
// Public library surface for the server, the CLI and integration tests.

pub mod analyze;
pub mod api;
pub mod cache;
pub mod chat;
pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod metrics;
pub mod model;
pub mod sentiment;
pub mod subject;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{Aggregator, ScoringConfig};
pub use crate::api::{router, AppState};
pub use crate::cache::ScoreCache;
pub use crate::chat::{ChatController, StreamEvent};
pub use crate::config::Settings;
pub use crate::error::LikabilityError;
pub use crate::model::{CompositeResult, SignalResult, SignalSource};
pub use crate::subject::Subject;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "likability=info,warn";

/// Compact tracing to stderr, filtered by `RUST_LOG`. A no-op when a global
/// subscriber is already installed (Shuttle installs its own).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}
