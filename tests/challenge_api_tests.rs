// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge creation, visibility and deletion via the HTTP surface.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use stepup_api::models::Role;
use tower::ServiceExt;

mod common;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_entry_status_at_creation() {
    let (app, state, _clock) = common::create_test_app();
    let user = common::seed_user(&state, "Ana", 70.0, 175.0);
    let token = common::create_test_jwt(user.id, &state.config.jwt_signing_key);

    // Current window, endless -> Active
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/challenges",
            &token,
            json!({
                "name": "March walk",
                "metric_type": "Steps",
                "start_date": "2026-03-01",
                "end_date": "2026-03-20",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "Active");

    // Future start -> Draft
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/challenges",
            &token,
            json!({
                "name": "April walk",
                "metric_type": "Steps",
                "start_date": "2026-04-01",
                "end_date": "2026-04-20",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "Draft");

    // Back-dated endless window -> Completed on arrival
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/challenges",
            &token,
            json!({
                "name": "February walk",
                "metric_type": "Steps",
                "start_date": "2026-02-01",
                "end_date": "2026-02-20",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "Completed");

    // Back-dated but with a target -> still Active
    let response = app
        .oneshot(post_json(
            "/api/challenges",
            &token,
            json!({
                "name": "February target",
                "metric_type": "Steps",
                "start_date": "2026-02-01",
                "end_date": "2026-02-20",
                "target_value": 100000.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "Active");
}

#[tokio::test]
async fn test_calorie_challenges_forbidden() {
    let (app, state, _clock) = common::create_test_app();
    let user = common::seed_user(&state, "Ana", 70.0, 175.0);
    let token = common::create_test_jwt(user.id, &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/challenges",
            &token,
            json!({
                "name": "Burn it",
                "metric_type": "CalorieBurn",
                "start_date": "2026-03-01",
                "end_date": "2026-03-20",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_end_date_before_start_rejected() {
    let (app, state, _clock) = common::create_test_app();
    let user = common::seed_user(&state, "Ana", 70.0, 175.0);
    let token = common::create_test_jwt(user.id, &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/challenges",
            &token,
            json!({
                "name": "Backwards",
                "metric_type": "Steps",
                "start_date": "2026-03-20",
                "end_date": "2026-03-01",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sponsored_challenge_requires_partner_and_prize() {
    let (app, state, _clock) = common::create_test_app();
    let user = common::seed_user(&state, "Ana", 70.0, 175.0);
    let partner = common::seed_user_with_role(&state, "Sponsor", 80.0, 180.0, Role::Partner);
    let user_token = common::create_test_jwt(user.id, &state.config.jwt_signing_key);
    let partner_token = common::create_test_jwt(partner.id, &state.config.jwt_signing_key);

    let body = json!({
        "name": "Sponsored run",
        "metric_type": "Running",
        "start_date": "2026-03-01",
        "end_date": "2026-03-20",
        "prize": "A pair of shoes",
        "is_public": false,
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/challenges/sponsored", &user_token, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut no_prize = body.clone();
    no_prize["prize"] = Value::Null;
    let response = app
        .clone()
        .oneshot(post_json("/api/challenges/sponsored", &partner_token, no_prize))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json("/api/challenges/sponsored", &partner_token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["is_sponsored"], true);
    // Sponsored challenges are always public, whatever the request said
    assert_eq!(json["is_public"], true);
    assert_eq!(json["sponsor_id"].as_u64(), Some(partner.id));
}

#[tokio::test]
async fn test_private_challenge_visible_to_creator_and_friends_only() {
    let (app, state, _clock) = common::create_test_app();
    let creator = common::seed_user(&state, "Creator", 70.0, 175.0);
    let friend = common::seed_user(&state, "Friend", 70.0, 175.0);
    let stranger = common::seed_user(&state, "Stranger", 70.0, 175.0);
    state.db.add_friendship(creator.id, friend.id);

    let creator_token = common::create_test_jwt(creator.id, &state.config.jwt_signing_key);
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/challenges",
            &creator_token,
            json!({
                "name": "Private walk",
                "metric_type": "Steps",
                "start_date": "2026-03-01",
                "end_date": "2026-03-20",
                "is_public": false,
            }),
        ))
        .await
        .unwrap();
    let challenge_id = body_json(response).await["id"].as_u64().unwrap();
    let uri = format!("/api/challenges/{}", challenge_id);

    for (user, expected) in [
        (&creator, StatusCode::OK),
        (&friend, StatusCode::OK),
        // A stranger gets forbidden, not not-found
        (&stranger, StatusCode::FORBIDDEN),
    ] {
        let token = common::create_test_jwt(user.id, &state.config.jwt_signing_key);
        let response = app.clone().oneshot(get(&uri, Some(&token))).await.unwrap();
        assert_eq!(response.status(), expected, "viewer {}", user.name);
    }

    // Anonymous reads keep the historic unfiltered behavior
    let response = app.oneshot(get(&uri, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_listing_filters_by_visibility() {
    let (app, state, _clock) = common::create_test_app();
    let creator = common::seed_user(&state, "Creator", 70.0, 175.0);
    let stranger = common::seed_user(&state, "Stranger", 70.0, 175.0);
    let creator_token = common::create_test_jwt(creator.id, &state.config.jwt_signing_key);

    for (name, public) in [("Public walk", true), ("Private walk", false)] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/challenges",
                &creator_token,
                json!({
                    "name": name,
                    "metric_type": "Steps",
                    "start_date": "2026-03-01",
                    "end_date": "2026-03-20",
                    "is_public": public,
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Anonymous: everything
    let response = app.clone().oneshot(get("/api/challenges", None)).await.unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    // The creator sees both of their own
    let response = app
        .clone()
        .oneshot(get("/api/challenges", Some(&creator_token)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    // A stranger only sees the public one
    let stranger_token = common::create_test_jwt(stranger.id, &state.config.jwt_signing_key);
    let response = app
        .oneshot(get("/api/challenges", Some(&stranger_token)))
        .await
        .unwrap();
    let listed = body_json(response).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "Public walk");
}

#[tokio::test]
async fn test_stats_listing_reports_lifecycle_flags() {
    let (app, state, _clock) = common::create_test_app();
    let user = common::seed_user(&state, "Ana", 70.0, 175.0);
    let token = common::create_test_jwt(user.id, &state.config.jwt_signing_key);

    let active = common::seed_steps_challenge(
        &state,
        "2026-03-01",
        "2026-03-20",
        None,
        stepup_api::models::ChallengeStatus::Active,
    );
    common::seed_steps_challenge(
        &state,
        "2026-04-01",
        "2026-04-20",
        None,
        stepup_api::models::ChallengeStatus::Draft,
    );
    state
        .participation_service
        .join(user.id, active.id)
        .unwrap();

    let response = app
        .oneshot(get("/api/challenges/stats", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);

    let active_row = listed
        .iter()
        .find(|c| c["id"].as_u64() == Some(active.id))
        .unwrap();
    assert_eq!(active_row["is_active"], true);
    assert_eq!(active_row["is_upcoming"], false);
    assert_eq!(active_row["participant_count"].as_u64(), Some(1));

    let upcoming_row = listed
        .iter()
        .find(|c| c["id"].as_u64() != Some(active.id))
        .unwrap();
    assert_eq!(upcoming_row["is_upcoming"], true);
    assert_eq!(upcoming_row["is_active"], false);
}

#[tokio::test]
async fn test_delete_requires_creator_sponsor_or_admin() {
    let (app, state, _clock) = common::create_test_app();
    let creator = common::seed_user(&state, "Creator", 70.0, 175.0);
    let stranger = common::seed_user(&state, "Stranger", 70.0, 175.0);
    let admin = common::seed_user_with_role(&state, "Admin", 70.0, 175.0, Role::Admin);
    let creator_token = common::create_test_jwt(creator.id, &state.config.jwt_signing_key);

    let mut ids = Vec::new();
    for name in ["Mine", "Mine too"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/challenges",
                &creator_token,
                json!({
                    "name": name,
                    "metric_type": "Steps",
                    "start_date": "2026-03-01",
                    "end_date": "2026-03-20",
                }),
            ))
            .await
            .unwrap();
        ids.push(body_json(response).await["id"].as_u64().unwrap());
    }

    fn delete_request(id: u64, token: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/challenges/{}", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    let stranger_token = common::create_test_jwt(stranger.id, &state.config.jwt_signing_key);
    let response = app
        .clone()
        .oneshot(delete_request(ids[0], &stranger_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(delete_request(ids[0], &creator_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.db.get_challenge(ids[0]).is_none());

    let admin_token = common::create_test_jwt(admin.id, &state.config.jwt_signing_key);
    let response = app
        .oneshot(delete_request(ids[1], &admin_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
