// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity log model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The dimension an activity entry (or a challenge) measures.
///
/// `CalorieBurn` is special: users may log calories directly via health
/// sync, but most calorie entries are derived from another entry, and
/// challenges can never target calories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    Steps,
    Running,
    PhysicalExercises,
    CalorieBurn,
}

impl MetricType {
    /// Only physical-exercise entries carry an exercise sub-type.
    pub fn requires_exercise_type(self) -> bool {
        self == MetricType::PhysicalExercises
    }
}

/// One raw metric entry for a user on a UTC calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: u64,
    pub user_id: u64,
    /// The day the activity happened (UTC, day granularity). Distinct from
    /// `created_at`, which records when the entry was logged.
    pub date: NaiveDate,
    pub metric_value: f64,
    pub metric_type: MetricType,
    /// Exercise sub-type; set iff `metric_type` is `PhysicalExercises`.
    pub exercise_type: Option<String>,
    /// For auto-generated calorie entries: the entry they were derived from.
    pub parent_entry_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
