// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory table store with typed operations.
//!
//! Tables are flat id-keyed maps with explicit foreign keys; there are no
//! embedded object graphs. Provides high-level operations for:
//! - Users (profile lookup for estimation and authorization)
//! - Activity logs (raw metric entries + sum aggregation)
//! - Challenges (definitions, lifecycle queries, completion latch)
//! - Participations (one row per user/challenge, score batch updates)
//! - Notifications and friendships (collaborator tables)

use crate::error::AppError;
use crate::models::{
    ActivityLogEntry, Challenge, ChallengeStatus, MetricType, Notification, Participation, User,
};
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to all tables. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Database {
    inner: Arc<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: AtomicU64,
    users: DashMap<u64, User>,
    activity_logs: DashMap<u64, ActivityLogEntry>,
    challenges: DashMap<u64, Challenge>,
    participations: DashMap<u64, Participation>,
    /// (user_id, challenge_id) uniqueness guard for participations
    participation_keys: DashSet<(u64, u64)>,
    notifications: DashMap<u64, Notification>,
    /// Normalized (low, high) user-id pairs
    friendships: DashSet<(u64, u64)>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    // ─── User Operations ─────────────────────────────────────────

    pub fn get_user(&self, user_id: u64) -> Option<User> {
        self.inner.users.get(&user_id).map(|u| u.clone())
    }

    /// Create or update a user. An id of 0 means "assign one".
    pub fn upsert_user(&self, mut user: User) -> User {
        if user.id == 0 {
            user.id = self.next_id();
        }
        self.inner.users.insert(user.id, user.clone());
        user
    }

    // ─── Friendship Operations ───────────────────────────────────

    fn friend_key(a: u64, b: u64) -> (u64, u64) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn add_friendship(&self, a: u64, b: u64) {
        self.inner.friendships.insert(Self::friend_key(a, b));
    }

    pub fn are_friends(&self, a: u64, b: u64) -> bool {
        self.inner.friendships.contains(&Self::friend_key(a, b))
    }

    pub fn friend_ids(&self, user_id: u64) -> Vec<u64> {
        self.inner
            .friendships
            .iter()
            .filter_map(|pair| {
                let (a, b) = *pair;
                if a == user_id {
                    Some(b)
                } else if b == user_id {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }

    // ─── Activity Log Operations ─────────────────────────────────

    /// Store a new activity entry, assigning its id.
    pub fn insert_activity_log(&self, mut entry: ActivityLogEntry) -> ActivityLogEntry {
        entry.id = self.next_id();
        self.inner.activity_logs.insert(entry.id, entry.clone());
        entry
    }

    pub fn get_activity_log(&self, id: u64) -> Option<ActivityLogEntry> {
        self.inner.activity_logs.get(&id).map(|e| e.clone())
    }

    pub fn update_activity_log(&self, entry: ActivityLogEntry) -> Result<(), AppError> {
        match self.inner.activity_logs.get_mut(&entry.id) {
            Some(mut slot) => {
                *slot = entry;
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Activity log {} not found",
                entry.id
            ))),
        }
    }

    /// Delete an entry. Returns `false` if it did not exist.
    pub fn delete_activity_log(&self, id: u64) -> bool {
        self.inner.activity_logs.remove(&id).is_some()
    }

    /// A user's entries, newest first, optionally filtered by date range and
    /// metric type.
    pub fn logs_for_user(
        &self,
        user_id: u64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        metric_type: Option<MetricType>,
        limit: usize,
    ) -> Vec<ActivityLogEntry> {
        let mut logs: Vec<ActivityLogEntry> = self
            .inner
            .activity_logs
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| start_date.is_none_or(|start| e.date >= start))
            .filter(|e| end_date.is_none_or(|end| e.date <= end))
            .filter(|e| metric_type.is_none_or(|m| e.metric_type == m))
            .map(|e| e.clone())
            .collect();

        logs.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        logs.truncate(limit);
        logs
    }

    /// Sum of matching metric values for a user over an inclusive date range.
    ///
    /// This is the aggregation query the scoring engine runs: filtered by
    /// metric type, optionally by exact exercise sub-type, and optionally to
    /// entries recorded at or after a cutoff (the join-time guard against
    /// back-dated entries).
    pub fn sum_metric(
        &self,
        user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        metric_type: MetricType,
        exercise_type: Option<&str>,
        created_at_from: Option<DateTime<Utc>>,
    ) -> f64 {
        let exercise_type = exercise_type.map(str::trim).filter(|s| !s.is_empty());

        self.inner
            .activity_logs
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| e.date >= start_date && e.date <= end_date)
            .filter(|e| e.metric_type == metric_type)
            .filter(|e| match exercise_type {
                Some(wanted) => e.exercise_type.as_deref() == Some(wanted),
                None => true,
            })
            .filter(|e| created_at_from.is_none_or(|cutoff| e.created_at >= cutoff))
            .map(|e| e.metric_value)
            .sum()
    }

    // ─── Challenge Operations ────────────────────────────────────

    pub fn insert_challenge(&self, mut challenge: Challenge) -> Challenge {
        challenge.id = self.next_id();
        self.inner.challenges.insert(challenge.id, challenge.clone());
        challenge
    }

    pub fn get_challenge(&self, id: u64) -> Option<Challenge> {
        self.inner.challenges.get(&id).map(|c| c.clone())
    }

    pub fn update_challenge(&self, challenge: Challenge) -> Result<(), AppError> {
        match self.inner.challenges.get_mut(&challenge.id) {
            Some(mut slot) => {
                *slot = challenge;
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Challenge {} not found",
                challenge.id
            ))),
        }
    }

    /// Delete a challenge and its participations. Returns `false` if absent.
    pub fn delete_challenge(&self, id: u64) -> bool {
        if self.inner.challenges.remove(&id).is_none() {
            return false;
        }
        let orphaned: Vec<u64> = self
            .inner
            .participations
            .iter()
            .filter(|p| p.challenge_id == id)
            .map(|p| p.id)
            .collect();
        for pid in orphaned {
            if let Some((_, p)) = self.inner.participations.remove(&pid) {
                self.inner
                    .participation_keys
                    .remove(&(p.user_id, p.challenge_id));
            }
        }
        true
    }

    /// All challenges ordered by start date.
    pub fn all_challenges(&self) -> Vec<Challenge> {
        let mut challenges: Vec<Challenge> =
            self.inner.challenges.iter().map(|c| c.clone()).collect();
        challenges.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
        challenges
    }

    /// Endless challenges whose window is over but which are not yet frozen.
    /// These are the sweep's recompute targets. Draft rows count too: a
    /// challenge can run its whole window without a single recompute.
    pub fn expired_endless_challenges(&self, today: NaiveDate) -> Vec<Challenge> {
        self.inner
            .challenges
            .iter()
            .filter(|c| {
                matches!(
                    c.status,
                    ChallengeStatus::Active | ChallengeStatus::Draft
                )
            })
            .filter(|c| !c.has_target())
            .filter(|c| c.end_date < today)
            .map(|c| c.clone())
            .collect()
    }

    /// Promote a Draft challenge whose start day has arrived to Active.
    /// Returns the current row either way.
    pub fn activate_challenge(&self, id: u64) -> Option<Challenge> {
        self.inner.challenges.get_mut(&id).map(|mut challenge| {
            if challenge.status == ChallengeStatus::Draft {
                challenge.status = ChallengeStatus::Active;
            }
            challenge.clone()
        })
    }

    /// Completed challenges whose completion is older than the cutoff
    /// (retention purge candidates).
    pub fn completed_challenges_older_than(&self, cutoff: DateTime<Utc>) -> Vec<Challenge> {
        self.inner
            .challenges
            .iter()
            .filter(|c| c.status == ChallengeStatus::Completed)
            .filter(|c| matches!(c.completed_at, Some(at) if at < cutoff))
            .map(|c| c.clone())
            .collect()
    }

    /// One-way completion latch.
    ///
    /// Atomically transitions the challenge to Completed iff it is still
    /// Active with no completion timestamp, freezing `completed_at` and the
    /// winner. Returns `false` if another caller won the race (or the
    /// challenge is gone); the loser must not emit notifications.
    pub fn try_complete_challenge(
        &self,
        id: u64,
        completed_at: DateTime<Utc>,
        winner_user_id: Option<u64>,
    ) -> bool {
        match self.inner.challenges.get_mut(&id) {
            Some(mut challenge)
                if challenge.status == ChallengeStatus::Active
                    && challenge.completed_at.is_none() =>
            {
                challenge.status = ChallengeStatus::Completed;
                challenge.completed_at = Some(completed_at);
                challenge.winner_user_id = winner_user_id;
                true
            }
            _ => false,
        }
    }

    // ─── Participation Operations ────────────────────────────────

    /// Insert a participation; rejects duplicates per (user, challenge).
    pub fn insert_participation(
        &self,
        mut participation: Participation,
    ) -> Result<Participation, AppError> {
        let key = (participation.user_id, participation.challenge_id);
        if !self.inner.participation_keys.insert(key) {
            return Err(AppError::Conflict(format!(
                "User {} already participates in challenge {}",
                key.0, key.1
            )));
        }
        participation.id = self.next_id();
        self.inner
            .participations
            .insert(participation.id, participation.clone());
        Ok(participation)
    }

    pub fn participation_exists(&self, user_id: u64, challenge_id: u64) -> bool {
        self.inner
            .participation_keys
            .contains(&(user_id, challenge_id))
    }

    pub fn participations_for_challenge(&self, challenge_id: u64) -> Vec<Participation> {
        let mut participations: Vec<Participation> = self
            .inner
            .participations
            .iter()
            .filter(|p| p.challenge_id == challenge_id)
            .map(|p| p.clone())
            .collect();
        participations.sort_by_key(|p| p.id);
        participations
    }

    pub fn participations_for_user(&self, user_id: u64) -> Vec<Participation> {
        let mut participations: Vec<Participation> = self
            .inner
            .participations
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.clone())
            .collect();
        participations.sort_by_key(|p| p.id);
        participations
    }

    /// Replace the stored score of each listed participation.
    ///
    /// Each row update is atomic; rows deleted concurrently are skipped.
    pub fn replace_participation_scores(&self, scores: &[(u64, f64)]) {
        for &(participation_id, score) in scores {
            if let Some(mut p) = self.inner.participations.get_mut(&participation_id) {
                p.total_score = score;
            }
        }
    }

    // ─── Notification Operations ─────────────────────────────────

    pub fn add_notifications(&self, notifications: Vec<Notification>) {
        for mut n in notifications {
            n.id = self.next_id();
            self.inner.notifications.insert(n.id, n);
        }
    }

    pub fn notifications_for_user(&self, user_id: u64) -> Vec<Notification> {
        let mut notifications: Vec<Notification> = self
            .inner
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.clone())
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse::<chrono::NaiveDateTime>().unwrap().and_utc()
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn entry(
        user_id: u64,
        date: &str,
        value: f64,
        metric_type: MetricType,
        exercise_type: Option<&str>,
        created_at: &str,
    ) -> ActivityLogEntry {
        ActivityLogEntry {
            id: 0,
            user_id,
            date: d(date),
            metric_value: value,
            metric_type,
            exercise_type: exercise_type.map(String::from),
            parent_entry_id: None,
            created_at: ts(created_at),
            updated_at: None,
        }
    }

    #[test]
    fn test_sum_metric_filters_by_type_and_range() {
        let db = Database::new();
        db.insert_activity_log(entry(1, "2026-03-01", 1000.0, MetricType::Steps, None, "2026-03-01T10:00:00"));
        db.insert_activity_log(entry(1, "2026-03-02", 2000.0, MetricType::Steps, None, "2026-03-02T10:00:00"));
        db.insert_activity_log(entry(1, "2026-03-02", 5.0, MetricType::Running, None, "2026-03-02T11:00:00"));
        db.insert_activity_log(entry(2, "2026-03-02", 9000.0, MetricType::Steps, None, "2026-03-02T10:00:00"));
        db.insert_activity_log(entry(1, "2026-03-05", 4000.0, MetricType::Steps, None, "2026-03-05T10:00:00"));

        let total = db.sum_metric(1, d("2026-03-01"), d("2026-03-02"), MetricType::Steps, None, None);
        assert_eq!(total, 3000.0);
    }

    #[test]
    fn test_sum_metric_exercise_type_is_exact() {
        let db = Database::new();
        db.insert_activity_log(entry(
            1, "2026-03-01", 30.0, MetricType::PhysicalExercises, Some("Flotări"), "2026-03-01T10:00:00",
        ));
        db.insert_activity_log(entry(
            1, "2026-03-01", 50.0, MetricType::PhysicalExercises, Some("Abdomene"), "2026-03-01T10:00:00",
        ));

        let total = db.sum_metric(
            1,
            d("2026-03-01"),
            d("2026-03-01"),
            MetricType::PhysicalExercises,
            Some("Flotări"),
            None,
        );
        assert_eq!(total, 30.0);
    }

    #[test]
    fn test_sum_metric_created_at_cutoff() {
        let db = Database::new();
        db.insert_activity_log(entry(1, "2026-03-01", 1000.0, MetricType::Steps, None, "2026-03-01T10:00:00"));
        db.insert_activity_log(entry(1, "2026-03-01", 500.0, MetricType::Steps, None, "2026-03-03T10:00:00"));

        // Only the entry recorded after the cutoff counts, even though both
        // are dated inside the range.
        let total = db.sum_metric(
            1,
            d("2026-03-01"),
            d("2026-03-05"),
            MetricType::Steps,
            None,
            Some(ts("2026-03-02T00:00:00")),
        );
        assert_eq!(total, 500.0);
    }

    #[test]
    fn test_participation_uniqueness() {
        let db = Database::new();
        let p = Participation {
            id: 0,
            user_id: 1,
            challenge_id: 7,
            total_score: 0.0,
            created_at: ts("2026-03-01T10:00:00"),
        };
        db.insert_participation(p.clone()).unwrap();
        let err = db.insert_participation(p).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_completion_latch_is_one_way() {
        let db = Database::new();
        let ch = db.insert_challenge(Challenge {
            id: 0,
            name: "March steps".to_string(),
            description: None,
            metric_type: MetricType::Steps,
            start_date: d("2026-03-01"),
            end_date: d("2026-03-10"),
            status: ChallengeStatus::Active,
            target_value: None,
            exercise_type: None,
            is_sponsored: false,
            prize: None,
            sponsor_id: None,
            created_by_user_id: None,
            is_public: true,
            completed_at: None,
            winner_user_id: None,
            created_at: ts("2026-03-01T00:00:00"),
        });

        assert!(db.try_complete_challenge(ch.id, ts("2026-03-11T00:00:00"), Some(1)));
        // Second attempt loses the race and must not overwrite the winner
        assert!(!db.try_complete_challenge(ch.id, ts("2026-03-12T00:00:00"), Some(2)));

        let stored = db.get_challenge(ch.id).unwrap();
        assert_eq!(stored.winner_user_id, Some(1));
        assert_eq!(stored.completed_at, Some(ts("2026-03-11T00:00:00")));
    }

    #[test]
    fn test_friendship_is_symmetric() {
        let db = Database::new();
        db.add_friendship(5, 9);
        assert!(db.are_friends(5, 9));
        assert!(db.are_friends(9, 5));
        assert!(!db.are_friends(5, 6));
        assert_eq!(db.friend_ids(9), vec![5]);
    }

    #[test]
    fn test_upsert_user_assigns_id() {
        let db = Database::new();
        let user = db.upsert_user(User {
            id: 0,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role: Role::User,
            is_suspended: false,
            height_cm: Some(170.0),
            weight_kg: Some(60.0),
            daily_steps_goal: 10_000,
            created_at: ts("2026-01-01T00:00:00"),
        });
        assert!(user.id > 0);
        assert_eq!(db.get_user(user.id).unwrap().name, "Ana");
    }
}
