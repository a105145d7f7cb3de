// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use stepup_api::clock::ManualClock;
use stepup_api::config::Config;
use stepup_api::db::Database;
use stepup_api::models::{
    ActivityLogEntry, Challenge, ChallengeStatus, MetricType, Role, User,
};
use stepup_api::routes::create_router;
use stepup_api::AppState;

/// The frozen "now" all tests start from.
#[allow(dead_code)]
pub fn test_time() -> DateTime<Utc> {
    ts("2026-03-10T12:00:00")
}

#[allow(dead_code)]
pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse::<chrono::NaiveDateTime>()
        .expect("valid timestamp")
        .and_utc()
}

#[allow(dead_code)]
pub fn d(s: &str) -> NaiveDate {
    s.parse().expect("valid date")
}

/// Create app state over a fresh store and a manual clock.
#[allow(dead_code)]
pub fn create_test_state() -> (Arc<AppState>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(test_time()));
    let state = Arc::new(AppState::new(
        Config::default(),
        Database::new(),
        clock.clone(),
    ));
    (state, clock)
}

/// Create a test app (router + state + clock).
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<ManualClock>) {
    let (state, clock) = create_test_state();
    (create_router(state.clone()), state, clock)
}

/// Seed a user with the given fitness profile.
#[allow(dead_code)]
pub fn seed_user(state: &AppState, name: &str, weight_kg: f64, height_cm: f64) -> User {
    seed_user_with_role(state, name, weight_kg, height_cm, Role::User)
}

#[allow(dead_code)]
pub fn seed_user_with_role(
    state: &AppState,
    name: &str,
    weight_kg: f64,
    height_cm: f64,
    role: Role,
) -> User {
    state.db.upsert_user(User {
        id: 0,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        role,
        is_suspended: false,
        height_cm: Some(height_cm),
        weight_kg: Some(weight_kg),
        daily_steps_goal: 10_000,
        created_at: state.clock.now(),
    })
}

/// Create a session token the way the auth middleware expects it.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: u64, signing_key: &[u8]) -> String {
    stepup_api::middleware::auth::create_jwt(user_id, signing_key).expect("Failed to create JWT")
}

/// Seed a public Steps challenge directly into the store.
#[allow(dead_code)]
pub fn seed_steps_challenge(
    state: &AppState,
    start: &str,
    end: &str,
    target_value: Option<f64>,
    status: ChallengeStatus,
) -> Challenge {
    state.db.insert_challenge(Challenge {
        id: 0,
        name: "Test Challenge".to_string(),
        description: None,
        metric_type: MetricType::Steps,
        start_date: d(start),
        end_date: d(end),
        status,
        target_value,
        exercise_type: None,
        is_sponsored: false,
        prize: None,
        sponsor_id: None,
        created_by_user_id: None,
        is_public: true,
        completed_at: None,
        winner_user_id: None,
        created_at: state.clock.now(),
    })
}

/// Seed a raw activity entry with an explicit creation timestamp, bypassing
/// the validation and rescoring paths.
#[allow(dead_code)]
pub fn seed_entry(
    state: &AppState,
    user_id: u64,
    date: &str,
    value: f64,
    metric_type: MetricType,
    created_at: DateTime<Utc>,
) -> ActivityLogEntry {
    state.db.insert_activity_log(ActivityLogEntry {
        id: 0,
        user_id,
        date: d(date),
        metric_value: value,
        metric_type,
        exercise_type: None,
        parent_entry_id: None,
        created_at,
        updated_at: None,
    })
}
