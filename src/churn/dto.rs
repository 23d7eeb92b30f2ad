use serde::Serialize;

use crate::churn::model::PredictionSummary;
use crate::churn::row::ChurnLabel;

/// Per-row labels plus the churned / not-churned counts.
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub predictions: Vec<&'static str>,
    pub churned_count: usize,
    pub non_churned_count: usize,
}

impl PredictionResponse {
    pub fn from_labels(labels: Vec<ChurnLabel>) -> Self {
        let summary = PredictionSummary::from_labels(&labels);
        Self {
            predictions: labels.iter().map(ChurnLabel::as_str).collect(),
            churned_count: summary.churned_count,
            non_churned_count: summary.non_churned_count,
        }
    }
}

/// Response of an admin-triggered training run.
#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub trained_rows: usize,
}
