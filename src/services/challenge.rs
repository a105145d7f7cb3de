// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge lifecycle service: creation, visibility, listing, deletion.

use crate::clock::Clock;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Challenge, Lifecycle, MetricType, Role};
use crate::services::scoring::ScoringEngine;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;

/// A validated request to create a challenge.
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub name: String,
    pub description: Option<String>,
    pub metric_type: MetricType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_value: Option<f64>,
    pub exercise_type: Option<String>,
    pub is_sponsored: bool,
    pub prize: Option<String>,
    pub is_public: bool,
}

/// A challenge enriched with participation stats and derived flags for
/// listing views. The flags are presentation-only and all come from
/// [`Challenge::lifecycle`].
#[derive(Debug, serde::Serialize)]
pub struct ChallengeWithStats {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub participant_count: usize,
    pub is_upcoming: bool,
    pub is_active: bool,
    pub is_completed: bool,
    pub winner_name: Option<String>,
    pub created_by_name: Option<String>,
}

#[derive(Clone)]
pub struct ChallengeService {
    db: Database,
    clock: Arc<dyn Clock>,
    scoring: ScoringEngine,
}

impl ChallengeService {
    pub fn new(db: Database, clock: Arc<dyn Clock>, scoring: ScoringEngine) -> Self {
        Self { db, clock, scoring }
    }

    /// Create a challenge. `creator` is the authenticated user, when any.
    pub fn create(&self, mut req: NewChallenge, creator: Option<u64>) -> Result<Challenge> {
        if req.metric_type == MetricType::CalorieBurn {
            return Err(AppError::Validation(
                "CalorieBurn challenges are not allowed; calories are derived, not a target"
                    .to_string(),
            ));
        }

        if req.metric_type.requires_exercise_type() {
            let trimmed = req
                .exercise_type
                .as_deref()
                .map(str::trim)
                .unwrap_or_default();
            if trimmed.is_empty() {
                return Err(AppError::Validation(
                    "An exercise type must be selected for this challenge".to_string(),
                ));
            }
            req.exercise_type = Some(trimmed.to_string());
        } else {
            req.exercise_type = None;
        }

        if req.end_date < req.start_date {
            return Err(AppError::Validation(
                "The end date cannot precede the start date".to_string(),
            ));
        }

        // Sponsored challenges may only be created by partners, carry a
        // prize, and name the creator as sponsor.
        let sponsor_id = if req.is_sponsored {
            let user_id = creator.ok_or(AppError::Unauthorized)?;
            let user = self
                .db
                .get_user(user_id)
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
            if user.role != Role::Partner {
                return Err(AppError::Forbidden(
                    "Only partners can create sponsored challenges".to_string(),
                ));
            }
            if req.prize.as_deref().map(str::trim).unwrap_or_default().is_empty() {
                return Err(AppError::Validation(
                    "A prize must be set for sponsored challenges".to_string(),
                ));
            }
            Some(user_id)
        } else {
            req.prize = None;
            None
        };

        let now = self.clock.now();
        let has_target = matches!(req.target_value, Some(t) if t > 0.0);
        let status =
            Challenge::entry_status(req.start_date, req.end_date, has_target, now.date_naive());

        let challenge = self.db.insert_challenge(Challenge {
            id: 0,
            name: req.name,
            description: req.description,
            metric_type: req.metric_type,
            start_date: req.start_date,
            end_date: req.end_date,
            status,
            target_value: req.target_value,
            exercise_type: req.exercise_type,
            is_sponsored: req.is_sponsored,
            prize: req.prize,
            sponsor_id,
            created_by_user_id: creator,
            is_public: req.is_public,
            completed_at: None,
            winner_user_id: None,
            created_at: now,
        });

        tracing::info!(
            challenge_id = challenge.id,
            name = %challenge.name,
            status = ?challenge.status,
            "Challenge created"
        );

        Ok(challenge)
    }

    /// Create a sponsored challenge on behalf of a partner. Always public.
    pub fn create_sponsored(&self, mut req: NewChallenge, partner_id: u64) -> Result<Challenge> {
        req.is_sponsored = true;
        req.is_public = true;
        self.create(req, Some(partner_id))
    }

    /// Load a challenge, enforcing private-challenge visibility when a
    /// viewer is supplied.
    pub fn get(&self, id: u64, viewer: Option<u64>) -> Result<Challenge> {
        let challenge = self
            .db
            .get_challenge(id)
            .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", id)))?;
        self.check_visibility(&challenge, viewer)?;
        Ok(challenge)
    }

    /// Private challenges are visible to their creator and the creator's
    /// friends. Anonymous reads are deliberately not restricted here; the
    /// stricter signal only applies once a user context exists.
    pub fn check_visibility(&self, challenge: &Challenge, viewer: Option<u64>) -> Result<()> {
        if challenge.is_public {
            return Ok(());
        }
        let (Some(viewer), Some(creator)) = (viewer, challenge.created_by_user_id) else {
            return Ok(());
        };
        if viewer == creator || self.db.are_friends(viewer, creator) {
            return Ok(());
        }
        Err(AppError::Forbidden(
            "This challenge is private; only friends of the creator can access it".to_string(),
        ))
    }

    /// List challenges. Without a viewer this returns everything (the
    /// historic default); with one, only public + own + friends' private.
    pub fn list(&self, viewer: Option<u64>) -> Vec<Challenge> {
        let challenges = self.db.all_challenges();
        let Some(viewer) = viewer else {
            return challenges;
        };

        let friends: HashSet<u64> = self.db.friend_ids(viewer).into_iter().collect();
        challenges
            .into_iter()
            .filter(|c| {
                c.is_public
                    || c.created_by_user_id == Some(viewer)
                    || c.created_by_user_id
                        .is_some_and(|creator| friends.contains(&creator))
            })
            .collect()
    }

    /// List challenges with participant counts and derived lifecycle flags.
    ///
    /// Runs a sweep first so expired challenges show as completed and stale
    /// completed ones are gone, mirroring how the data is served to the
    /// dashboard.
    pub fn list_with_stats(&self, viewer: Option<u64>) -> Vec<ChallengeWithStats> {
        let report = self.scoring.sweep();
        if report.completed > 0 || report.purged > 0 {
            tracing::debug!(
                completed = report.completed,
                purged = report.purged,
                "Sweep ran before stats listing"
            );
        }

        let today = self.clock.today();
        self.list(viewer)
            .into_iter()
            .map(|challenge| {
                let participant_count = self
                    .db
                    .participations_for_challenge(challenge.id)
                    .len();
                let lifecycle = challenge.lifecycle(today);
                let winner_name = challenge
                    .winner_user_id
                    .and_then(|id| self.db.get_user(id))
                    .map(|u| u.name);
                let created_by_name = challenge
                    .created_by_user_id
                    .and_then(|id| self.db.get_user(id))
                    .map(|u| u.name);
                ChallengeWithStats {
                    participant_count,
                    is_upcoming: lifecycle == Lifecycle::Upcoming,
                    is_active: lifecycle == Lifecycle::Active,
                    is_completed: lifecycle == Lifecycle::Completed,
                    winner_name,
                    created_by_name,
                    challenge,
                }
            })
            .collect()
    }

    /// Delete a challenge. Allowed for its creator, its sponsor, or admins.
    pub fn delete(&self, id: u64, user_id: u64) -> Result<()> {
        let challenge = self
            .db
            .get_challenge(id)
            .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", id)))?;
        let user = self
            .db
            .get_user(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let is_owner = challenge.created_by_user_id == Some(user_id);
        let is_sponsor = challenge.sponsor_id == Some(user_id);
        if !is_owner && !is_sponsor && user.role != Role::Admin {
            return Err(AppError::Forbidden(
                "You are not allowed to delete this challenge".to_string(),
            ));
        }

        self.db.delete_challenge(id);
        tracing::info!(challenge_id = id, deleted_by = user_id, "Challenge deleted");
        Ok(())
    }
}
