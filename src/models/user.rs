//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role. Partners may sponsor challenges; admins may delete any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Partner,
    Admin,
}

/// User profile.
///
/// Registration, password handling and email verification live outside this
/// service; the scoring engine only needs the fitness profile and role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_suspended: bool,
    /// Height in centimeters (needed for step-distance estimation)
    pub height_cm: Option<f64>,
    /// Weight in kilograms (needed for calorie estimation)
    pub weight_kg: Option<f64>,
    pub daily_steps_goal: u32,
    pub created_at: DateTime<Utc>,
}
