// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity log service.
//!
//! Handles the core workflow for a metric entry:
//! 1. Validate the date window and exercise sub-type
//! 2. Store the entry
//! 3. Estimate calories and store the derived CalorieBurn entry
//! 4. Trigger rescoring of the owner's open challenge participations

use crate::clock::Clock;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{ActivityLogEntry, MetricType};
use crate::services::estimator::{estimate, Estimate};
use crate::services::scoring::{RecomputeOutcome, ScoringEngine};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;

/// Oldest accepted activity date, relative to today.
const MAX_BACKDATE_DAYS: i64 = 7;

/// The named exercise sub-types broken out in the daily metrics view.
const PUSHUPS: &str = "Flotări";
const SQUATS: &str = "Genuflexiuni";
const ABS: &str = "Abdomene";

/// A validated request to create or update an entry.
#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub date: NaiveDate,
    pub metric_value: f64,
    pub metric_type: MetricType,
    pub exercise_type: Option<String>,
    pub parent_entry_id: Option<u64>,
}

/// What a create accomplished: the entry, any estimation, and the
/// per-challenge rescoring outcomes.
#[derive(Debug)]
pub struct LoggedActivity {
    pub entry: ActivityLogEntry,
    pub estimate: Estimate,
    pub rescored: Vec<RecomputeOutcome>,
}

/// One day's totals per metric, plus the named exercise breakdowns.
#[derive(Debug, serde::Serialize)]
pub struct DailyMetrics {
    pub steps: f64,
    pub calories: f64,
    pub running_km: f64,
    pub pushups: f64,
    pub squats: f64,
    pub abs: f64,
}

/// Aggregate summary with streaks and achievement tags.
#[derive(Debug, serde::Serialize)]
pub struct ActivitySummary {
    pub user_id: u64,
    pub total_activities: usize,
    pub total_steps: f64,
    pub total_calories: f64,
    pub current_streak_days: u32,
    pub best_streak_days: u32,
    pub achievements: Vec<String>,
}

/// Per-day totals for the daily summary view.
#[derive(Debug, serde::Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub steps: f64,
    pub calories: f64,
    pub running: f64,
    pub physical_exercises: f64,
    pub total_activities: usize,
}

#[derive(Clone)]
pub struct ActivityService {
    db: Database,
    clock: Arc<dyn Clock>,
    scoring: ScoringEngine,
}

impl ActivityService {
    pub fn new(db: Database, clock: Arc<dyn Clock>, scoring: ScoringEngine) -> Self {
        Self { db, clock, scoring }
    }

    /// Create an entry on behalf of a user, with the derived-calorie side
    /// effect and rescoring.
    pub fn create_log(&self, user_id: u64, mut log: NewActivityLog) -> Result<LoggedActivity> {
        self.validate(&mut log)?;

        // Calorie entries only exist as derived records; the API cannot
        // manufacture them directly.
        if log.metric_type == MetricType::CalorieBurn && log.parent_entry_id.is_none() {
            return Err(AppError::Validation(
                "Burned calories are generated automatically from an activity".to_string(),
            ));
        }

        let entry = self.insert_raw(user_id, &log);

        let estimate = if log.metric_type != MetricType::CalorieBurn {
            self.record_estimated_calories(user_id, &entry)
        } else {
            Estimate::default()
        };

        let rescored = self.scoring.recompute_for_user(user_id);

        Ok(LoggedActivity {
            entry,
            estimate,
            rescored,
        })
    }

    /// Store an entry without boundary validation.
    ///
    /// Internal writers (health sync, derived calorie entries) land here;
    /// their dates were validated by their own entry points.
    pub fn insert_raw(&self, user_id: u64, log: &NewActivityLog) -> ActivityLogEntry {
        self.db.insert_activity_log(ActivityLogEntry {
            id: 0,
            user_id,
            date: log.date,
            metric_value: log.metric_value,
            metric_type: log.metric_type,
            exercise_type: log.exercise_type.clone(),
            parent_entry_id: log.parent_entry_id,
            created_at: self.clock.now(),
            updated_at: None,
        })
    }

    /// Update an entry's value/date/type, then rescore.
    pub fn update_log(
        &self,
        id: u64,
        user_id: u64,
        mut log: NewActivityLog,
    ) -> Result<(ActivityLogEntry, Vec<RecomputeOutcome>)> {
        self.validate(&mut log)?;

        let mut entry = self
            .db
            .get_activity_log(id)
            .filter(|e| e.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Activity log {} not found", id)))?;

        entry.date = log.date;
        entry.metric_value = log.metric_value;
        entry.metric_type = log.metric_type;
        entry.exercise_type = log.exercise_type;
        entry.updated_at = Some(self.clock.now());
        self.db.update_activity_log(entry.clone())?;

        let rescored = self.scoring.recompute_for_user(user_id);
        Ok((entry, rescored))
    }

    /// Delete an entry, then rescore.
    pub fn delete_log(&self, id: u64, user_id: u64) -> Result<Vec<RecomputeOutcome>> {
        let exists = self
            .db
            .get_activity_log(id)
            .is_some_and(|e| e.user_id == user_id);
        if !exists || !self.db.delete_activity_log(id) {
            return Err(AppError::NotFound(format!("Activity log {} not found", id)));
        }

        Ok(self.scoring.recompute_for_user(user_id))
    }

    /// Date-window and exercise-type validation shared by create and update.
    fn validate(&self, log: &mut NewActivityLog) -> Result<()> {
        let today = self.clock.today();
        if log.date > today {
            return Err(AppError::Validation(
                "Activities cannot be logged for the future".to_string(),
            ));
        }
        if log.date < today - Duration::days(MAX_BACKDATE_DAYS) {
            return Err(AppError::Validation(format!(
                "Activities older than {} days cannot be logged",
                MAX_BACKDATE_DAYS
            )));
        }

        if log.metric_type.requires_exercise_type() {
            let trimmed = log
                .exercise_type
                .as_deref()
                .map(str::trim)
                .unwrap_or_default();
            if trimmed.is_empty() {
                return Err(AppError::Validation(
                    "An exercise type must be selected for physical exercises".to_string(),
                ));
            }
            log.exercise_type = Some(trimmed.to_string());
        } else {
            log.exercise_type = None;
        }

        Ok(())
    }

    /// Estimate calories for a stored entry and, when positive, record the
    /// derived CalorieBurn entry linked to it.
    fn record_estimated_calories(&self, user_id: u64, entry: &ActivityLogEntry) -> Estimate {
        let Some(user) = self.db.get_user(user_id) else {
            return Estimate::default();
        };

        let est = estimate(
            &user,
            entry.metric_type,
            entry.metric_value,
            entry.exercise_type.as_deref(),
        );

        if let Some(calories) = est.calories.filter(|c| *c > 0.0) {
            self.insert_raw(
                user_id,
                &NewActivityLog {
                    date: entry.date,
                    metric_value: calories,
                    metric_type: MetricType::CalorieBurn,
                    exercise_type: None,
                    parent_entry_id: Some(entry.id),
                },
            );
        }

        est
    }

    // ─── Read Operations ─────────────────────────────────────────

    pub fn list_logs(
        &self,
        user_id: u64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        metric_type: Option<MetricType>,
        limit: usize,
    ) -> Vec<ActivityLogEntry> {
        self.db
            .logs_for_user(user_id, start_date, end_date, metric_type, limit.clamp(1, 200))
    }

    /// Totals for one calendar day, per metric and named exercise.
    pub fn daily_metrics(&self, user_id: u64, date: Option<NaiveDate>) -> DailyMetrics {
        let day = date.unwrap_or_else(|| self.clock.today());
        let sum = |metric, exercise: Option<&str>| {
            self.db.sum_metric(user_id, day, day, metric, exercise, None)
        };

        DailyMetrics {
            steps: sum(MetricType::Steps, None),
            calories: sum(MetricType::CalorieBurn, None),
            running_km: sum(MetricType::Running, None),
            pushups: sum(MetricType::PhysicalExercises, Some(PUSHUPS)),
            squats: sum(MetricType::PhysicalExercises, Some(SQUATS)),
            abs: sum(MetricType::PhysicalExercises, Some(ABS)),
        }
    }

    /// Totals, streaks and achievement tags over the last year.
    pub fn summary(&self, user_id: u64) -> ActivitySummary {
        let today = self.clock.today();
        let start = today - Duration::days(365);
        let logs = self
            .db
            .logs_for_user(user_id, Some(start), Some(today), None, 10_000);

        let total_steps: f64 = logs
            .iter()
            .filter(|l| l.metric_type == MetricType::Steps)
            .map(|l| l.metric_value)
            .sum();
        let total_calories: f64 = logs
            .iter()
            .filter(|l| l.metric_type == MetricType::CalorieBurn)
            .map(|l| l.metric_value)
            .sum();

        let mut active_dates: Vec<NaiveDate> = logs.iter().map(|l| l.date).collect();
        active_dates.sort();
        active_dates.dedup();

        // Current streak: consecutive active days ending today
        let active_set: std::collections::HashSet<NaiveDate> =
            active_dates.iter().copied().collect();
        let mut current_streak = 0u32;
        let mut cursor = today;
        while active_set.contains(&cursor) {
            current_streak += 1;
            cursor -= Duration::days(1);
        }

        // Best streak over the whole window
        let mut best_streak = 0u32;
        let mut run = 0u32;
        let mut prev: Option<NaiveDate> = None;
        for date in &active_dates {
            run = match prev {
                Some(p) if *date == p + Duration::days(1) => run + 1,
                _ => 1,
            };
            best_streak = best_streak.max(run);
            prev = Some(*date);
        }

        let mut achievements = Vec::new();
        if !logs.is_empty() {
            achievements.push("first_activity".to_string());
        }
        if best_streak >= 7 {
            achievements.push("streak_7".to_string());
        }
        if best_streak >= 30 {
            achievements.push("streak_30".to_string());
        }

        let mut steps_by_day: HashMap<NaiveDate, f64> = HashMap::new();
        for log in logs.iter().filter(|l| l.metric_type == MetricType::Steps) {
            *steps_by_day.entry(log.date).or_insert(0.0) += log.metric_value;
        }
        if steps_by_day.values().any(|total| *total >= 10_000.0) {
            achievements.push("steps_10k".to_string());
        }

        ActivitySummary {
            user_id,
            total_activities: logs.len(),
            total_steps,
            total_calories,
            current_streak_days: current_streak,
            best_streak_days: best_streak,
            achievements,
        }
    }

    /// Per-day totals for the last `days` days (clamped to 1..=90 and to the
    /// user's account age).
    pub fn daily_summary(&self, user_id: u64, days: i64) -> Result<Vec<DailySummary>> {
        let user = self
            .db
            .get_user(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let today = self.clock.today();
        let account_age_days = (today - user.created_at.date_naive()).num_days() + 1;
        let days = days.clamp(1, 90).min(account_age_days.max(1));
        let start = today - Duration::days(days - 1);

        let logs = self
            .db
            .logs_for_user(user_id, Some(start), Some(today), None, 10_000);

        let mut by_day: HashMap<NaiveDate, Vec<&ActivityLogEntry>> = HashMap::new();
        for log in &logs {
            by_day.entry(log.date).or_default().push(log);
        }

        let mut summaries = Vec::with_capacity(days as usize);
        let mut day = start;
        while day <= today {
            let day_logs = by_day.get(&day).map(Vec::as_slice).unwrap_or_default();
            let sum_of = |metric: MetricType| -> f64 {
                day_logs
                    .iter()
                    .filter(|l| l.metric_type == metric)
                    .map(|l| l.metric_value)
                    .sum()
            };
            summaries.push(DailySummary {
                date: day,
                steps: sum_of(MetricType::Steps),
                calories: sum_of(MetricType::CalorieBurn),
                running: sum_of(MetricType::Running),
                physical_exercises: sum_of(MetricType::PhysicalExercises),
                total_activities: day_logs.len(),
            });
            day += Duration::days(1);
        }

        Ok(summaries)
    }

    /// Shared date-window check for entry points that validate before the
    /// internal insert path (health sync).
    pub fn check_date_window(&self, date: NaiveDate) -> Result<()> {
        let today = self.clock.today();
        if date > today {
            return Err(AppError::Validation(
                "Cannot sync data for the future".to_string(),
            ));
        }
        if date < today - Duration::days(MAX_BACKDATE_DAYS) {
            return Err(AppError::Validation(format!(
                "Cannot sync data older than {} days",
                MAX_BACKDATE_DAYS
            )));
        }
        Ok(())
    }
}
