use serde::{Deserialize, Serialize};

use cv_core::UrgencyLabel;

/// Bijection between the labels seen at fit time and class indices `0..k`.
/// Classes are ordered by severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<UrgencyLabel>,
}

impl LabelEncoder {
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a UrgencyLabel>) -> Self {
        let mut classes: Vec<UrgencyLabel> = labels.into_iter().copied().collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[UrgencyLabel] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn transform(&self, label: UrgencyLabel) -> Option<usize> {
        self.classes.binary_search(&label).ok()
    }

    pub fn inverse_transform(&self, index: usize) -> Option<UrgencyLabel> {
        self.classes.get(index).copied()
    }
}
