// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity log routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityLogEntry, MetricType};
use crate::services::activity::{ActivitySummary, DailyMetrics, DailySummary, NewActivityLog};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Routes under `/api/activity` (auth required; applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activity", post(create_activity).get(list_activities))
        .route(
            "/api/activity/{id}",
            put(update_activity).delete(delete_activity),
        )
        .route("/api/activity/daily-metrics", get(daily_metrics))
        .route("/api/activity/summary", get(activity_summary))
        .route("/api/activity/daily-summary", get(daily_summary))
}

// ─── Create / Update / Delete ────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct ActivityRequest {
    pub date: NaiveDate,
    #[validate(range(min = 0.0))]
    pub metric_value: f64,
    pub metric_type: MetricType,
    pub exercise_type: Option<String>,
    pub parent_entry_id: Option<u64>,
}

impl ActivityRequest {
    fn into_log(self) -> NewActivityLog {
        NewActivityLog {
            date: self.date,
            metric_value: self.metric_value,
            metric_type: self.metric_type,
            exercise_type: self.exercise_type,
            parent_entry_id: self.parent_entry_id,
        }
    }
}

#[derive(Serialize)]
pub struct ActivityResponse {
    pub entry: ActivityLogEntry,
    /// Number of challenges successfully rescored by this write
    pub challenges_updated: usize,
    pub estimated_calories: Option<f64>,
    pub estimated_distance_km: Option<f64>,
}

/// Log an activity entry for the authenticated user.
async fn create_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ActivityRequest>,
) -> Result<Json<ActivityResponse>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let logged = state
        .activity_service
        .create_log(user.user_id, req.into_log())?;

    let challenges_updated = logged
        .rescored
        .iter()
        .filter(|o| o.result.is_ok())
        .count();

    Ok(Json(ActivityResponse {
        entry: logged.entry,
        challenges_updated,
        estimated_calories: logged.estimate.calories,
        estimated_distance_km: logged.estimate.distance_km,
    }))
}

#[derive(Serialize)]
pub struct UpdateActivityResponse {
    pub entry: ActivityLogEntry,
    pub challenges_updated: usize,
}

async fn update_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
    Json(req): Json<ActivityRequest>,
) -> Result<Json<UpdateActivityResponse>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (entry, rescored) = state
        .activity_service
        .update_log(id, user.user_id, req.into_log())?;

    Ok(Json(UpdateActivityResponse {
        entry,
        challenges_updated: rescored.iter().filter(|o| o.result.is_ok()).count(),
    }))
}

#[derive(Serialize)]
pub struct DeleteActivityResponse {
    pub challenges_updated: usize,
}

async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteActivityResponse>> {
    let rescored = state.activity_service.delete_log(id, user.user_id)?;

    Ok(Json(DeleteActivityResponse {
        challenges_updated: rescored.iter().filter(|o| o.result.is_ok()).count(),
    }))
}

// ─── Reads ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    metric_type: Option<MetricType>,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    30
}

/// Get the authenticated user's activity log, newest first.
async fn list_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<ActivityLogEntry>>> {
    let logs = state.activity_service.list_logs(
        user.user_id,
        params.start_date,
        params.end_date,
        params.metric_type,
        params.limit,
    );
    Ok(Json(logs))
}

#[derive(Deserialize)]
struct DailyMetricsQuery {
    date: Option<NaiveDate>,
}

/// One day's metric totals (defaults to today).
async fn daily_metrics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<DailyMetricsQuery>,
) -> Result<Json<DailyMetrics>> {
    Ok(Json(
        state.activity_service.daily_metrics(user.user_id, params.date),
    ))
}

/// Totals, streaks and achievements over the last year.
async fn activity_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ActivitySummary>> {
    Ok(Json(state.activity_service.summary(user.user_id)))
}

#[derive(Deserialize)]
struct DailySummaryQuery {
    #[serde(default = "default_days")]
    days: i64,
}

fn default_days() -> i64 {
    7
}

/// Per-day totals for the last N days.
async fn daily_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<DailySummaryQuery>,
) -> Result<Json<Vec<DailySummary>>> {
    let summaries = state
        .activity_service
        .daily_summary(user.user_id, params.days)?;
    Ok(Json(summaries))
}
