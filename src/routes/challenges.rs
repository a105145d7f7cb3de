// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge routes.
//!
//! Reads take an optional user context: anonymous callers get the
//! unfiltered listing (historic default) while authenticated ones get the
//! visibility-filtered view and the private-challenge access check.

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::models::{Challenge, MetricType};
use crate::services::challenge::{ChallengeWithStats, NewChallenge};
use crate::services::participation::LeaderboardEntry;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Read routes: anonymous allowed, user context attached when present.
/// The optional-auth middleware is applied in routes/mod.rs.
pub fn read_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/challenges", get(list_challenges))
        .route("/api/challenges/stats", get(list_challenges_with_stats))
        .route("/api/challenges/{id}", get(get_challenge))
        .route("/api/challenges/{id}/leaderboard", get(get_leaderboard))
}

/// Write routes (auth required; applied in routes/mod.rs).
pub fn write_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/challenges", post(create_challenge))
        .route("/api/challenges/sponsored", post(create_sponsored_challenge))
        .route("/api/challenges/{id}", delete(delete_challenge))
        .route("/api/challenges/{id}/join", post(join_challenge))
}

#[derive(Deserialize, Validate)]
pub struct CreateChallengeRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub metric_type: MetricType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_value: Option<f64>,
    pub exercise_type: Option<String>,
    #[serde(default)]
    pub is_sponsored: bool,
    pub prize: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

impl CreateChallengeRequest {
    fn into_new_challenge(self) -> NewChallenge {
        NewChallenge {
            name: self.name,
            description: self.description,
            metric_type: self.metric_type,
            start_date: self.start_date,
            end_date: self.end_date,
            target_value: self.target_value,
            exercise_type: self.exercise_type,
            is_sponsored: self.is_sponsored,
            prize: self.prize,
            is_public: self.is_public,
        }
    }
}

/// Create a challenge owned by the authenticated user.
async fn create_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<Json<Challenge>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let challenge = state
        .challenge_service
        .create(req.into_new_challenge(), Some(user.user_id))?;
    Ok(Json(challenge))
}

/// Create a sponsored (always public) challenge. Partner role required.
async fn create_sponsored_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<Json<Challenge>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let challenge = state
        .challenge_service
        .create_sponsored(req.into_new_challenge(), user.user_id)?;
    Ok(Json(challenge))
}

async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Extension(maybe): Extension<MaybeAuthUser>,
) -> Result<Json<Vec<Challenge>>> {
    let viewer = maybe.0.map(|u| u.user_id);
    Ok(Json(state.challenge_service.list(viewer)))
}

async fn list_challenges_with_stats(
    State(state): State<Arc<AppState>>,
    Extension(maybe): Extension<MaybeAuthUser>,
) -> Result<Json<Vec<ChallengeWithStats>>> {
    let viewer = maybe.0.map(|u| u.user_id);
    Ok(Json(state.challenge_service.list_with_stats(viewer)))
}

async fn get_challenge(
    State(state): State<Arc<AppState>>,
    Extension(maybe): Extension<MaybeAuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<Challenge>> {
    let viewer = maybe.0.map(|u| u.user_id);
    Ok(Json(state.challenge_service.get(id, viewer)?))
}

async fn delete_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>> {
    state.challenge_service.delete(id, user.user_id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(maybe): Extension<MaybeAuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    let viewer = maybe.0.map(|u| u.user_id);
    Ok(Json(state.participation_service.leaderboard(id, viewer)?))
}

/// Join a challenge as the authenticated user.
async fn join_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<crate::models::Participation>> {
    let participation = state.participation_service.join(user.user_id, id)?;
    Ok(Json(participation))
}
