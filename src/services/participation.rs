// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Joining challenges and the leaderboard view.

use crate::clock::Clock;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Lifecycle, Participation};
use crate::services::challenge::ChallengeService;
use std::sync::Arc;

/// One leaderboard row.
#[derive(Debug, serde::Serialize)]
pub struct LeaderboardEntry {
    pub user_id: u64,
    pub user_name: String,
    pub total_score: f64,
}

#[derive(Clone)]
pub struct ParticipationService {
    db: Database,
    clock: Arc<dyn Clock>,
    challenges: ChallengeService,
}

impl ParticipationService {
    pub fn new(db: Database, clock: Arc<dyn Clock>, challenges: ChallengeService) -> Self {
        Self {
            db,
            clock,
            challenges,
        }
    }

    /// Join a challenge. Upcoming challenges are joinable; completed and
    /// cancelled ones are not, and private ones require friendship with the
    /// creator. Duplicate joins are conflicts.
    pub fn join(&self, user_id: u64, challenge_id: u64) -> Result<Participation> {
        let user = self
            .db
            .get_user(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let challenge = self
            .db
            .get_challenge(challenge_id)
            .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", challenge_id)))?;

        match challenge.lifecycle(self.clock.today()) {
            Lifecycle::Active | Lifecycle::Upcoming => {}
            Lifecycle::Completed => {
                return Err(AppError::Validation(format!(
                    "Challenge {} has already ended",
                    challenge_id
                )));
            }
            Lifecycle::Cancelled => {
                return Err(AppError::Validation(format!(
                    "Challenge {} has been cancelled",
                    challenge_id
                )));
            }
        }

        self.challenges
            .check_visibility(&challenge, Some(user_id))?;

        let participation = self.db.insert_participation(Participation {
            id: 0,
            user_id,
            challenge_id,
            total_score: 0.0,
            created_at: self.clock.now(),
        })?;

        tracing::info!(
            user_id = user.id,
            challenge_id,
            participation_id = participation.id,
            "User joined challenge"
        );

        Ok(participation)
    }

    /// Leaderboard for a challenge: all participants ordered by score
    /// descending. Subject to the private-challenge visibility gate.
    pub fn leaderboard(
        &self,
        challenge_id: u64,
        viewer: Option<u64>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let challenge = self
            .db
            .get_challenge(challenge_id)
            .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", challenge_id)))?;
        self.challenges.check_visibility(&challenge, viewer)?;

        let mut rows: Vec<LeaderboardEntry> = self
            .db
            .participations_for_challenge(challenge_id)
            .into_iter()
            .map(|p| {
                let user_name = self
                    .db
                    .get_user(p.user_id)
                    .map(|u| u.name)
                    .unwrap_or_default();
                LeaderboardEntry {
                    user_id: p.user_id,
                    user_name,
                    total_score: p.total_score,
                }
            })
            .collect();

        // Stable sort: ties keep join order beyond the score ordering
        rows.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(rows)
    }

    pub fn for_user(&self, user_id: u64) -> Vec<Participation> {
        self.db.participations_for_user(user_id)
    }
}
