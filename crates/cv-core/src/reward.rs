//! Volunteer reward points.
//!
//! `points = round(base(label) * volunteer_multiplier * task_multiplier)`.
//! Rounding is `f64::round`: halfway cases go away from zero, so 2.5 becomes 3.

use std::str::FromStr;

use crate::label::UrgencyLabel;

pub fn base_points(label: UrgencyLabel) -> f64 {
    match label {
        UrgencyLabel::Critical => 100.0,
        UrgencyLabel::High => 70.0,
        UrgencyLabel::Medium => 40.0,
        UrgencyLabel::Low => 20.0,
    }
}

/// Reward for a label. Negative or NaN multipliers count as zero.
pub fn points(label: UrgencyLabel, volunteer_multiplier: f64, task_multiplier: f64) -> f64 {
    scaled(base_points(label), volunteer_multiplier, task_multiplier)
}

/// Same as [`points`] for a label given by name; unknown names earn nothing.
pub fn points_for_name(label: &str, volunteer_multiplier: f64, task_multiplier: f64) -> f64 {
    let base = UrgencyLabel::from_str(label).map(base_points).unwrap_or(0.0);
    scaled(base, volunteer_multiplier, task_multiplier)
}

fn scaled(base: f64, volunteer_multiplier: f64, task_multiplier: f64) -> f64 {
    let raw = base * non_negative(volunteer_multiplier) * non_negative(task_multiplier);
    if raw.is_finite() {
        raw.round()
    } else {
        0.0
    }
}

fn non_negative(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.max(0.0) }
}
