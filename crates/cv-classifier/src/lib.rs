//! Urgency classification: the fixed threshold rule and a multinomial
//! logistic regression trained on labeled feature vectors.

pub mod encoder;
pub mod logistic;
pub mod rule;
pub mod snapshot;
pub mod state;
pub mod trainer;

pub use encoder::LabelEncoder;
pub use logistic::{FitSummary, MultinomialLogit};
pub use rule::{classify_by_rule, classify_row_by_rule, rule_score};
pub use snapshot::TrainedSnapshot;
pub use state::ClassifierState;
pub use trainer::{fit_snapshot, label_rows};
