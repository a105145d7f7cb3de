// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! StepUp: fitness-challenge social backend
//!
//! This crate provides the backend API for logging activity metrics,
//! running time/target-bounded challenges, and ranking participants on
//! leaderboards. The heart of it is the challenge scoring engine in
//! [`services::scoring`].

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use clock::Clock;
use config::Config;
use db::Database;
use services::{ActivityService, ChallengeService, ParticipationService, ScoringEngine};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub clock: Arc<dyn Clock>,
    pub scoring_engine: ScoringEngine,
    pub activity_service: ActivityService,
    pub challenge_service: ChallengeService,
    pub participation_service: ParticipationService,
}

impl AppState {
    /// Wire up all services over one store and clock.
    pub fn new(config: Config, db: Database, clock: Arc<dyn Clock>) -> Self {
        let scoring_engine = ScoringEngine::new(db.clone(), clock.clone());
        let activity_service =
            ActivityService::new(db.clone(), clock.clone(), scoring_engine.clone());
        let challenge_service =
            ChallengeService::new(db.clone(), clock.clone(), scoring_engine.clone());
        let participation_service =
            ParticipationService::new(db.clone(), clock.clone(), challenge_service.clone());

        Self {
            config,
            db,
            clock,
            scoring_engine,
            activity_service,
            challenge_service,
            participation_service,
        }
    }
}
