use tracing::info;

use cv_classifier::classify_by_rule;
use cv_core::{DatasetRow, Result};
use cv_extract::SimulatedFeatureSource;
use cv_storage::DatasetStore;

/// `n` simulated rows labeled by the rule.
pub fn bootstrap_rows(n: usize, source: &SimulatedFeatureSource) -> Vec<DatasetRow> {
    (0..n)
        .map(|_| {
            let features = source.generate();
            DatasetRow::from_features(&features, Some(classify_by_rule(&features)))
        })
        .collect()
}

/// Seed an empty store with `n` simulated rows. Returns the rows written;
/// a non-empty store is left alone.
pub fn bootstrap_dataset(store: &dyn DatasetStore, n: usize, source: &SimulatedFeatureSource) -> Result<usize> {
    if n == 0 || !store.is_empty()? {
        return Ok(0);
    }
    let rows = bootstrap_rows(n, source);
    store.rewrite(&rows)?;
    info!(rows = n, dataset = %store.describe(), "bootstrapped dataset with simulated rows");
    Ok(n)
}
