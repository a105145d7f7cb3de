// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge-completion notification emitter.
//!
//! Writes one notice per participant; delivery is someone else's problem.
//! The scoring engine treats this as fire-and-forget: a failure here must
//! never roll back a completion.

use crate::clock::Clock;
use crate::db::Database;
use crate::models::{Notification, NotificationKind};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct Notifier {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl Notifier {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Notify every participant that a challenge ended. The winner gets a
    /// distinct notice.
    pub fn notify_challenge_completion(
        &self,
        challenge_id: u64,
        challenge_name: &str,
        winner_user_id: u64,
        participant_ids: &[u64],
    ) {
        let now = self.clock.now();
        let unique: HashSet<u64> = participant_ids.iter().copied().collect();

        let notifications: Vec<Notification> = unique
            .into_iter()
            .map(|user_id| {
                let is_winner = user_id == winner_user_id;
                let (kind, title, message) = if is_winner {
                    (
                        NotificationKind::ChallengeWon,
                        "You won!".to_string(),
                        format!("Congratulations, you won the challenge {}.", challenge_name),
                    )
                } else {
                    (
                        NotificationKind::ChallengeEnded,
                        "Challenge ended".to_string(),
                        format!("The challenge {} is over.", challenge_name),
                    )
                };
                Notification {
                    id: 0,
                    user_id,
                    title,
                    message,
                    kind,
                    challenge_id,
                    is_read: false,
                    created_at: now,
                }
            })
            .collect();

        if notifications.is_empty() {
            return;
        }

        let count = notifications.len();
        self.db.add_notifications(notifications);
        tracing::debug!(challenge_id, count, "Completion notifications recorded");
    }
}
