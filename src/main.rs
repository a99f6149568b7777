//! news-ranker service entrypoint.
//! Boots the Axum HTTP server with settings, source tiers and the feed cache.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use news_ranker::{api, telemetry, AppState};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    telemetry::init_dev_tracing();

    let state = AppState::from_env().context("loading settings")?;
    let router = api::router(state);

    Ok(router.into())
}
