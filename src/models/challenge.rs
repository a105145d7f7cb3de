// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Challenge model and the canonical lifecycle rules.

use crate::models::MetricType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stored challenge status.
///
/// `Draft` and `Active` record the state at creation time; whether a
/// challenge is currently open is always derived via [`Challenge::lifecycle`],
/// never by comparing dates ad hoc. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

/// Derived lifecycle state, computed from status + dates in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Lifecycle {
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

/// A time/target-bounded challenge users compete in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub metric_type: MetricType,
    /// First day of the scoring window (UTC, day granularity, inclusive)
    pub start_date: NaiveDate,
    /// Last day of the scoring window (UTC, day granularity, inclusive)
    pub end_date: NaiveDate,
    pub status: ChallengeStatus,
    /// Numeric goal; `None` (or <= 0) means the challenge is endless and
    /// completes purely by calendar expiry.
    pub target_value: Option<f64>,
    /// Exercise sub-type; set iff `metric_type` is `PhysicalExercises`.
    pub exercise_type: Option<String>,
    pub is_sponsored: bool,
    /// Prize text; set iff `is_sponsored`.
    pub prize: Option<String>,
    /// Sponsoring partner; set iff `is_sponsored`.
    pub sponsor_id: Option<u64>,
    pub created_by_user_id: Option<u64>,
    pub is_public: bool,
    /// Set exactly once, when the challenge completes. Once set, scores and
    /// winner are frozen forever.
    pub completed_at: Option<DateTime<Utc>>,
    pub winner_user_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    /// Whether this challenge has a numeric goal (a strictly positive target).
    pub fn has_target(&self) -> bool {
        matches!(self.target_value, Some(t) if t > 0.0)
    }

    /// The single source of truth for "where is this challenge in its life".
    ///
    /// Terminal stored statuses win outright. Otherwise the window dates
    /// decide: a challenge whose start day has not arrived is upcoming, an
    /// endless challenge past its end day is completed (the sweep will freeze
    /// it), everything else is active. Target challenges never expire by
    /// date; they stay active until someone reaches the target.
    pub fn lifecycle(&self, today: NaiveDate) -> Lifecycle {
        match self.status {
            ChallengeStatus::Cancelled => Lifecycle::Cancelled,
            ChallengeStatus::Completed => Lifecycle::Completed,
            _ if self.completed_at.is_some() => Lifecycle::Completed,
            _ if !self.has_target() && today > self.end_date => Lifecycle::Completed,
            _ if self.start_date > today => Lifecycle::Upcoming,
            _ => Lifecycle::Active,
        }
    }

    /// Stored status assigned at creation time.
    ///
    /// Target challenges are Draft until their start day, then Active; an
    /// endless challenge whose whole window is already in the past is
    /// Completed on arrival.
    pub fn entry_status(
        start_date: NaiveDate,
        end_date: NaiveDate,
        has_target: bool,
        today: NaiveDate,
    ) -> ChallengeStatus {
        if has_target {
            if start_date > today {
                ChallengeStatus::Draft
            } else {
                ChallengeStatus::Active
            }
        } else if start_date <= today && end_date >= today {
            ChallengeStatus::Active
        } else if start_date > today {
            ChallengeStatus::Draft
        } else {
            ChallengeStatus::Completed
        }
    }

    /// Whether new participants may still join (active or upcoming).
    pub fn is_joinable(&self, today: NaiveDate) -> bool {
        matches!(
            self.lifecycle(today),
            Lifecycle::Active | Lifecycle::Upcoming
        )
    }
}
