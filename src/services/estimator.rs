// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calorie and distance estimation from raw metric entries.
//!
//! Pure functions of the user's fitness profile; the caller is responsible
//! for persisting the derived calorie entry.

use crate::models::{MetricType, User};

/// Walking: kcal burned per kg of body weight per km
const WALKING_KCAL_PER_KG_KM: f64 = 0.53;
/// Running: kcal burned per kg of body weight per km
const RUNNING_KCAL_PER_KG_KM: f64 = 1.036;
/// Stride length as a fraction of body height
const STRIDE_HEIGHT_RATIO: f64 = 0.415;
/// Assumed exercise pace in reps per minute
const REPS_PER_MINUTE: f64 = 30.0;

/// Estimated calories (kcal) and distance (km) for one activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estimate {
    pub calories: Option<f64>,
    pub distance_km: Option<f64>,
}

impl Estimate {
    const NONE: Estimate = Estimate {
        calories: None,
        distance_km: None,
    };
}

/// Estimate calories (and distance, where meaningful) for an activity.
///
/// Returns an empty estimate when the profile lacks the needed measurements
/// or the input value is non-positive. Calorie entries are never
/// re-estimated; calories do not generate further calories.
pub fn estimate(
    user: &User,
    metric_type: MetricType,
    metric_value: f64,
    exercise_type: Option<&str>,
) -> Estimate {
    let Some(weight_kg) = user.weight_kg.filter(|w| *w > 0.0) else {
        return Estimate::NONE;
    };

    match metric_type {
        MetricType::Steps => {
            let Some(height_cm) = user.height_cm.filter(|h| *h > 0.0) else {
                return Estimate::NONE;
            };
            let stride_cm = height_cm * STRIDE_HEIGHT_RATIO;
            let distance_km = metric_value * stride_cm / 100_000.0;
            if distance_km <= 0.0 {
                return Estimate::NONE;
            }
            Estimate {
                calories: Some(round2(WALKING_KCAL_PER_KG_KM * weight_kg * distance_km)),
                distance_km: Some(round3(distance_km)),
            }
        }
        MetricType::Running => {
            // Input is already kilometers
            let distance_km = metric_value;
            if distance_km <= 0.0 {
                return Estimate::NONE;
            }
            Estimate {
                calories: Some(round2(RUNNING_KCAL_PER_KG_KM * weight_kg * distance_km)),
                distance_km: Some(round3(distance_km)),
            }
        }
        MetricType::PhysicalExercises => {
            let minutes = metric_value / REPS_PER_MINUTE;
            if minutes <= 0.0 {
                return Estimate::NONE;
            }
            let met = met_for_exercise(exercise_type.unwrap_or(""));
            // kcal/min = MET * 3.5 * kg / 200
            let calories = met * 3.5 * weight_kg / 200.0 * minutes;
            Estimate {
                calories: Some(round2(calories)),
                distance_km: None,
            }
        }
        MetricType::CalorieBurn => Estimate::NONE,
    }
}

/// MET value for an exercise sub-type, matched on the trimmed, lowercased
/// name. Unknown exercises get a generic moderate-intensity value.
fn met_for_exercise(exercise_type: &str) -> f64 {
    match exercise_type.trim().to_lowercase().as_str() {
        "flotări" | "flotari" => 8.0,
        "genuflexiuni" | "geno" => 5.0,
        "abdomene" => 3.8,
        _ => 6.0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
