//! Notification records written by the completion emitter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    ChallengeWon,
    ChallengeEnded,
}

/// A per-user notice. Delivery (push, email) is out of scope; this service
/// only records them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub challenge_id: u64,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
