//! Likability server: binary entrypoint.
//! Boots the Axum HTTP server on Shuttle, wiring settings, scoring config,
//! metrics, the background cache/history sweep and the chat/score routes.

use likability_analyzer::analyze::MAINTENANCE_INTERVAL;
use likability_analyzer::{api, metrics::Metrics, init_tracing, ScoringConfig, Settings};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env();
    let scoring = ScoringConfig::load_or_default(&settings.config_path);
    tracing::info!(
        config = %settings.config_path.display(),
        ttl_secs = settings.cache_ttl.as_secs(),
        status = ?settings.status(),
        "starting likability server"
    );

    let mut state = api::AppState::from_settings(&settings, scoring);
    let _sweeper = state.aggregator().spawn_maintenance(MAINTENANCE_INTERVAL);
    match Metrics::init(settings.cache_ttl) {
        Ok(m) => state = state.with_metrics(m.handle),
        Err(e) => tracing::warn!(error = %e, "prometheus recorder not installed, /metrics disabled"),
    }

    Ok(api::router(state).into())
}
