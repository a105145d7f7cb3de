// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge scoring engine.
//!
//! Recomputes participation scores from the activity log, decides challenge
//! completion and picks the winner. The engine is idempotent: scores are
//! replaced (never incremented) on every pass, and completion is a one-way
//! latch, so overlapping invocations from user requests and the sweep are
//! safe without mutual exclusion.

use crate::clock::Clock;
use crate::db::Database;
use crate::error::AppError;
use crate::models::{Challenge, ChallengeStatus, Lifecycle, MetricType, Participation};
use crate::services::Notifier;
use chrono::Duration;
use std::sync::Arc;

/// How long completed challenges are kept before the sweep purges them.
const COMPLETED_RETENTION_DAYS: i64 = 1;

/// Result of one successful recompute pass over a challenge.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRecompute {
    pub challenge_id: u64,
    pub participants: usize,
    /// Whether this pass transitioned the challenge to Completed.
    pub completed: bool,
}

/// Per-challenge outcome of a batch recompute. Failures are isolated: one
/// challenge failing never aborts the others.
#[derive(Debug)]
pub struct RecomputeOutcome {
    pub challenge_id: u64,
    pub result: Result<ScoreRecompute, AppError>,
}

/// What one sweep pass did.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub recomputed: usize,
    pub completed: usize,
    pub purged: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ScoringEngine {
    db: Database,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
}

impl ScoringEngine {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        let notifier = Notifier::new(db.clone(), clock.clone());
        Self {
            db,
            clock,
            notifier,
        }
    }

    /// Recompute every participation score of a challenge and run the
    /// completion check.
    ///
    /// No-op for challenges already frozen by a completion timestamp.
    pub fn recompute_scores(&self, challenge_id: u64) -> Result<ScoreRecompute, AppError> {
        let challenge = self
            .db
            .get_challenge(challenge_id)
            .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", challenge_id)))?;

        if challenge.status == ChallengeStatus::Completed && challenge.completed_at.is_some() {
            return Ok(ScoreRecompute {
                challenge_id,
                participants: 0,
                completed: false,
            });
        }

        let now = self.clock.now();
        let today = now.date_naive();

        // Draft is only an entry record; once the start day arrives the
        // stored status moves to Active so the completion latch can fire.
        let challenge = if challenge.status == ChallengeStatus::Draft
            && challenge.start_date <= today
        {
            self.db.activate_challenge(challenge.id).unwrap_or(challenge)
        } else {
            challenge
        };

        let participations = self.db.participations_for_challenge(challenge_id);

        // Aggregation window: from the challenge start (or the join day,
        // whichever is later) to the completion day, or "today" while a
        // target challenge is running, or the calendar end for endless ones.
        let range_end = match challenge.completed_at {
            Some(at) => at.date_naive(),
            None if challenge.has_target() => today,
            None => challenge.end_date,
        };

        let mut scores = Vec::with_capacity(participations.len());
        for participation in &participations {
            let joined_date = participation.created_at.date_naive();
            let range_start = joined_date.max(challenge.start_date);

            let total = self.db.sum_metric(
                participation.user_id,
                range_start,
                range_end,
                challenge.metric_type,
                if challenge.metric_type == MetricType::PhysicalExercises {
                    challenge.exercise_type.as_deref()
                } else {
                    None
                },
                Some(participation.created_at),
            );
            scores.push((participation.id, total));
        }
        self.db.replace_participation_scores(&scores);

        let completed = self.maybe_complete(&challenge, &scores, &participations)?;

        tracing::debug!(
            challenge_id,
            participants = scores.len(),
            completed,
            "Recomputed challenge scores"
        );

        Ok(ScoreRecompute {
            challenge_id,
            participants: scores.len(),
            completed,
        })
    }

    /// Completion check: target reached, or endless window expired.
    ///
    /// Only challenges stored as Active can complete; the transition itself
    /// is a compare-and-set so a concurrent pass cannot produce two winners.
    fn maybe_complete(
        &self,
        challenge: &Challenge,
        scores: &[(u64, f64)],
        participations: &[Participation],
    ) -> Result<bool, AppError> {
        if challenge.status != ChallengeStatus::Active {
            return Ok(false);
        }

        let now = self.clock.now();
        let target_reached = match challenge.target_value.filter(|t| *t > 0.0) {
            Some(target) => scores.iter().any(|(_, score)| *score >= target),
            None => false,
        };
        let expired = !challenge.has_target() && now.date_naive() > challenge.end_date;

        if !target_reached && !expired {
            return Ok(false);
        }

        // Winner: highest score, ties broken by earliest join. Absent when
        // nobody ever joined.
        let mut ranked: Vec<(&Participation, f64)> = participations
            .iter()
            .zip(scores.iter().map(|(_, s)| *s))
            .collect();
        ranked.sort_by(|(pa, sa), (pb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| pa.created_at.cmp(&pb.created_at))
        });
        let winner = ranked.first().map(|(p, _)| p.user_id);

        if !self.db.try_complete_challenge(challenge.id, now, winner) {
            // Another trigger got there first; its winner stands.
            tracing::debug!(challenge_id = challenge.id, "Completion already latched");
            return Ok(false);
        }

        tracing::info!(
            challenge_id = challenge.id,
            winner = ?winner,
            target_reached,
            "Challenge completed"
        );

        if let Some(winner_id) = winner {
            let participant_ids: Vec<u64> = participations.iter().map(|p| p.user_id).collect();
            self.notifier.notify_challenge_completion(
                challenge.id,
                &challenge.name,
                winner_id,
                &participant_ids,
            );
        }

        Ok(true)
    }

    /// Recompute every open challenge a user participates in.
    ///
    /// Called after each activity mutation and health sync. Failures are
    /// collected per challenge so the caller's primary write still succeeds.
    pub fn recompute_for_user(&self, user_id: u64) -> Vec<RecomputeOutcome> {
        let today = self.clock.today();
        let mut outcomes = Vec::new();

        for participation in self.db.participations_for_user(user_id) {
            let Some(challenge) = self.db.get_challenge(participation.challenge_id) else {
                continue;
            };
            if !matches!(
                challenge.lifecycle(today),
                Lifecycle::Active | Lifecycle::Upcoming
            ) {
                continue;
            }

            let result = self.recompute_scores(challenge.id);
            if let Err(err) = &result {
                tracing::warn!(
                    challenge_id = challenge.id,
                    user_id,
                    error = %err,
                    "Failed to recompute challenge scores"
                );
            }
            outcomes.push(RecomputeOutcome {
                challenge_id: challenge.id,
                result,
            });
        }

        outcomes
    }

    /// Periodic maintenance pass.
    ///
    /// Completes expired endless challenges even when no user activity
    /// triggers them anymore, then purges completed challenges past the
    /// retention window. Safe to run concurrently with live recomputes.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let now = self.clock.now();

        for challenge in self.db.expired_endless_challenges(now.date_naive()) {
            match self.recompute_scores(challenge.id) {
                Ok(recompute) => {
                    report.recomputed += 1;
                    if recompute.completed {
                        report.completed += 1;
                    }
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        challenge_id = challenge.id,
                        error = %err,
                        "Sweep failed to recompute expired challenge"
                    );
                }
            }
        }

        let cutoff = now - Duration::days(COMPLETED_RETENTION_DAYS);
        for challenge in self.db.completed_challenges_older_than(cutoff) {
            if self.db.delete_challenge(challenge.id) {
                report.purged += 1;
                tracing::info!(
                    challenge_id = challenge.id,
                    name = %challenge.name,
                    "Purged completed challenge past retention"
                );
            }
        }

        report
    }
}
