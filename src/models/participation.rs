//! Participation model: one row per (user, challenge).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's membership in a challenge, with their running score.
///
/// `total_score` is a derived aggregate: the scoring engine recomputes it
/// wholesale on every pass and never increments it. `created_at` is the join
/// timestamp and marks the lower bound of what activity counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participation {
    pub id: u64,
    pub user_id: u64,
    pub challenge_id: u64,
    pub total_score: f64,
    pub created_at: DateTime<Utc>,
}
