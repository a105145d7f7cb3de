// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Health-data sync routes (wearable/phone batch imports).

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::MetricType;
use crate::services::activity::NewActivityLog;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Routes under `/api/health` (auth required; applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health/sync", post(sync_health_data))
        .route("/api/health/stats", get(health_stats))
}

#[derive(Deserialize)]
pub struct SyncHealthRequest {
    pub date: NaiveDate,
    pub steps: Option<f64>,
    pub calories: Option<f64>,
    /// Extra device fields, echoed back but not stored as entries
    pub distance: Option<f64>,
    pub heart_rate: Option<f64>,
    pub active_minutes: Option<f64>,
    pub source: Option<String>,
}

#[derive(Serialize)]
pub struct SyncHealthResponse {
    pub date: NaiveDate,
    pub logs_created: usize,
    pub challenges_updated: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Import a day's worth of device data as activity entries.
///
/// Each metric is written independently; one failing does not abort the
/// batch. Rescoring runs once at the end if anything was written.
async fn sync_health_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SyncHealthRequest>,
) -> Result<Json<SyncHealthResponse>> {
    state.activity_service.check_date_window(req.date)?;

    let mut logs_created = 0;
    let mut warnings = Vec::new();

    // Device-reported calories land as direct CalorieBurn entries with no
    // parent; that is the one sanctioned way they enter without estimation.
    let batch = [
        (MetricType::Steps, req.steps),
        (MetricType::CalorieBurn, req.calories),
    ];

    for (metric_type, value) in batch {
        let Some(value) = value.filter(|v| *v > 0.0) else {
            continue;
        };
        state.activity_service.insert_raw(
            user.user_id,
            &NewActivityLog {
                date: req.date,
                metric_value: value,
                metric_type,
                exercise_type: None,
                parent_entry_id: None,
            },
        );
        logs_created += 1;
    }

    // Rescoring is best-effort: a challenge that fails to recompute becomes
    // a warning, never a failed sync.
    let mut challenges_updated = 0;
    if logs_created > 0 {
        for outcome in state.scoring_engine.recompute_for_user(user.user_id) {
            match outcome.result {
                Ok(_) => challenges_updated += 1,
                Err(err) => warnings.push(format!(
                    "Failed to rescore challenge {}: {}",
                    outcome.challenge_id, err
                )),
            }
        }
    }

    tracing::info!(
        user_id = user.user_id,
        date = %req.date,
        logs_created,
        challenges_updated,
        source = req.source.as_deref().unwrap_or("unknown"),
        "Health data synced"
    );

    Ok(Json(SyncHealthResponse {
        date: req.date,
        logs_created,
        challenges_updated,
        warnings,
    }))
}

#[derive(Deserialize)]
struct HealthStatsQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct HealthStatsResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_steps: f64,
    pub total_calories: f64,
    pub average_steps: f64,
    pub average_calories: f64,
}

/// Step/calorie totals and daily averages over a date range (defaults to
/// today only).
async fn health_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HealthStatsQuery>,
) -> Result<Json<HealthStatsResponse>> {
    let today = state.clock.today();
    let start = params.start_date.unwrap_or(today);
    let end = params.end_date.unwrap_or(today);

    let total_steps =
        state
            .db
            .sum_metric(user.user_id, start, end, MetricType::Steps, None, None);
    let total_calories =
        state
            .db
            .sum_metric(user.user_id, start, end, MetricType::CalorieBurn, None, None);

    let days = (end - start).num_days() + 1;
    let days = days.max(1) as f64;

    Ok(Json(HealthStatsResponse {
        start_date: start,
        end_date: end,
        total_steps,
        total_calories,
        average_steps: total_steps / days,
        average_calories: total_calories / days,
    }))
}
