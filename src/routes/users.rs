// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-facing reads: profile, participations, recorded notifications.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Notification, Participation, Role};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;

/// Routes (auth required; applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/participations", get(get_participations))
        .route("/api/notifications", get(get_notifications))
}

/// Current user response.
#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub daily_steps_goal: u32,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(UserResponse {
        user_id: profile.id,
        name: profile.name,
        email: profile.email,
        role: profile.role,
        height_cm: profile.height_cm,
        weight_kg: profile.weight_kg,
        daily_steps_goal: profile.daily_steps_goal,
    }))
}

/// The authenticated user's challenge participations.
async fn get_participations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Participation>>> {
    Ok(Json(state.participation_service.for_user(user.user_id)))
}

/// Recorded notifications, newest first.
async fn get_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Notification>>> {
    Ok(Json(state.db.notifications_for_user(user.user_id)))
}
