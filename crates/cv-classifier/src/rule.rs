//! Threshold rule over the three dominant severity signals.

use cv_core::{DatasetRow, FeatureVector, UrgencyLabel};

const CRITICAL_ABOVE: f64 = 0.7;
const HIGH_ABOVE: f64 = 0.5;
const MEDIUM_ABOVE: f64 = 0.3;

/// Mean of `danger_score`, `human_harm_risk` and `flooding_indicator`.
pub fn rule_score(features: &FeatureVector) -> f64 {
    mean3(features.danger_score, features.human_harm_risk, features.flooding_indicator)
}

pub fn classify_by_rule(features: &FeatureVector) -> UrgencyLabel {
    label_for_score(rule_score(features))
}

/// Rule over a raw row. Missing or non-numeric columns count as 0.
pub fn classify_row_by_rule(row: &DatasetRow) -> UrgencyLabel {
    let v = |column: &str| row.value(column).unwrap_or(0.0);
    label_for_score(mean3(v("danger_score"), v("human_harm_risk"), v("flooding_indicator")))
}

fn mean3(a: f64, b: f64, c: f64) -> f64 {
    (a + b + c) / 3.0
}

fn label_for_score(score: f64) -> UrgencyLabel {
    if score > CRITICAL_ABOVE {
        UrgencyLabel::Critical
    } else if score > HIGH_ABOVE {
        UrgencyLabel::High
    } else if score > MEDIUM_ABOVE {
        UrgencyLabel::Medium
    } else {
        UrgencyLabel::Low
    }
}
