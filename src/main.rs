// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StepUp API Server
//!
//! Runs the fitness-challenge backend: activity logging, challenge scoring
//! and leaderboards, plus the periodic sweep that completes expired
//! challenges and purges stale completed ones.

use std::sync::Arc;
use stepup_api::{clock::SystemClock, config::Config, db::Database, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting StepUp API");

    let db = Database::new();
    let clock = Arc::new(SystemClock);

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, clock));

    // Periodic sweep: completes expired endless challenges even when no user
    // activity triggers them, and purges completed challenges past retention.
    spawn_sweeper(state.clone());

    // Build router
    let app = stepup_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Run the challenge sweep on a fixed interval in the background.
fn spawn_sweeper(state: Arc<AppState>) {
    let interval = std::time::Duration::from_secs(state.config.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so startup stays quiet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let report = state.scoring_engine.sweep();
            if report.recomputed > 0 || report.purged > 0 || report.failed > 0 {
                tracing::info!(
                    recomputed = report.recomputed,
                    completed = report.completed,
                    purged = report.purged,
                    failed = report.failed,
                    "Challenge sweep finished"
                );
            }
        }
    });
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stepup_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
