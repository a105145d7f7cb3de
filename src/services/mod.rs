// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod challenge;
pub mod estimator;
pub mod notify;
pub mod participation;
pub mod scoring;

pub use activity::ActivityService;
pub use challenge::ChallengeService;
pub use notify::Notifier;
pub use participation::ParticipationService;
pub use scoring::ScoringEngine;
