use tracing::{info, warn};

use cv_core::config::TrainingConfig;
use cv_core::{DatasetRow, LabeledRecord, Result, TriageError};

use crate::encoder::LabelEncoder;
use crate::logistic::MultinomialLogit;
use crate::rule::classify_row_by_rule;
use crate::snapshot::TrainedSnapshot;

/// Turn raw rows into training records.
///
/// Feature columns are strict: a missing, non-numeric or out-of-range value is a
/// schema mismatch naming the row. A missing label is derived with the rule.
pub fn label_rows(rows: &[DatasetRow]) -> Result<Vec<LabeledRecord>> {
    let mut derived = 0usize;
    let records = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let features = row.to_feature_vector().map_err(|e| e.at_row(i))?;
            let label = match row.urgency_label {
                Some(label) => label,
                None => {
                    derived += 1;
                    classify_row_by_rule(row)
                }
            };
            Ok(LabeledRecord::new(features, label))
        })
        .collect::<Result<Vec<_>>>()?;
    if derived > 0 {
        info!(derived, total = records.len(), "derived missing urgency labels with the rule");
    }
    Ok(records)
}

/// Fit a fresh snapshot on the full set of records.
pub fn fit_snapshot(records: &[LabeledRecord], cfg: &TrainingConfig) -> Result<TrainedSnapshot> {
    if records.is_empty() {
        return Err(TriageError::Configuration("dataset is empty; nothing to train on".into()));
    }

    let encoder = LabelEncoder::fit(records.iter().map(|r| &r.label));
    let samples: Vec<[f64; 8]> = records.iter().map(|r| r.features.to_array()).collect();
    let targets = records
        .iter()
        .map(|r| {
            encoder
                .transform(r.label)
                .ok_or_else(|| TriageError::schema(format!("label {} missing from encoder", r.label)))
        })
        .collect::<Result<Vec<usize>>>()?;

    let (model, summary) = MultinomialLogit::fit(&samples, &targets, encoder.len(), cfg)?;
    if !summary.converged {
        warn!(
            iterations = summary.iterations,
            loss = summary.loss,
            "logistic regression hit max_iter before converging"
        );
    }

    let snapshot = TrainedSnapshot::new(encoder, model, records.len())?;
    info!(
        snapshot = %snapshot.id,
        rows = records.len(),
        classes = ?snapshot.classes(),
        iterations = summary.iterations,
        loss = summary.loss,
        "classifier fitted"
    );
    Ok(snapshot)
}
