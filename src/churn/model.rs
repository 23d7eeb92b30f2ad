use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::churn::encoder::OneHotEncoder;
use crate::churn::error::ChurnError;
use crate::churn::row::{ChurnLabel, CustomerRow, TrainingRow};

/// The persisted unit: fitted encoder and fitted model, inseparable.
///
/// Predictions run through the exact encoder that was fitted at training
/// time; there is no way to construct, save or load one half without the
/// other, so a mismatched pairing cannot exist.
#[derive(Serialize, Deserialize)]
pub struct ChurnArtifact {
    encoder: OneHotEncoder,
    model: GBDT,
}

impl std::fmt::Debug for ChurnArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChurnArtifact")
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}

impl ChurnArtifact {
    /// Train a new artifact from a labeled table.
    ///
    /// Fits the encoder on the table, encodes it, and fits the classifier.
    /// Label or category problems abort before anything can be persisted.
    pub fn train(rows: &[TrainingRow]) -> Result<Self, ChurnError> {
        if rows.is_empty() {
            return Err(ChurnError::Training("empty training table".into()));
        }

        let feature_rows: Vec<CustomerRow> = rows.iter().map(|r| r.features()).collect();
        let labels: Vec<u8> = rows
            .iter()
            .map(|r| r.label())
            .collect::<Result<_, ChurnError>>()?;

        let encoder = OneHotEncoder::fit(&feature_rows);
        let matrix: Vec<Vec<f32>> = feature_rows
            .iter()
            .map(|r| encoder.transform(r))
            .collect::<Result<_, ChurnError>>()?;

        let model = fit_classifier(encoder.width(), matrix, &labels)?;
        info!(rows = rows.len(), features = encoder.width(), "model trained");
        Ok(Self { encoder, model })
    }

    /// Score rows in input order through the stored encoder.
    pub fn predict(&self, rows: &[CustomerRow]) -> Result<Vec<ChurnLabel>, ChurnError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut batch: DataVec = Vec::with_capacity(rows.len());
        for row in rows {
            batch.push(Data::new_test_data(self.encoder.transform(row)?, None));
        }
        let probabilities = self.model.predict(&batch);
        Ok(probabilities
            .into_iter()
            .map(|p| {
                if p >= 0.5 {
                    ChurnLabel::Churn
                } else {
                    ChurnLabel::NoChurn
                }
            })
            .collect())
    }

    /// Write the bundled artifact as one JSON blob.
    pub fn save(&self, path: &Path) -> Result<(), ChurnError> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        info!(path = %path.display(), "artifact saved");
        Ok(())
    }

    /// Load a previously saved artifact.
    pub fn load(path: &Path) -> Result<Self, ChurnError> {
        let file = File::open(path)?;
        let artifact = serde_json::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), "artifact loaded");
        Ok(artifact)
    }
}

/// Fit the gradient-boosted classifier on an encoded matrix.
///
/// Fixed configuration, no hyperparameter search. The gbdt log-loss wants
/// labels in {-1, +1} and emits probabilities; the {0, 1} labels are mapped
/// at this boundary.
fn fit_classifier(
    feature_size: usize,
    matrix: Vec<Vec<f32>>,
    labels: &[u8],
) -> Result<GBDT, ChurnError> {
    if matrix.len() != labels.len() {
        return Err(ChurnError::Training(format!(
            "{} feature rows but {} labels",
            matrix.len(),
            labels.len()
        )));
    }
    if let Some(bad) = labels.iter().find(|&&l| l > 1) {
        return Err(ChurnError::Training(format!(
            "labels must be binary, got {bad}"
        )));
    }

    let mut cfg = Config::new();
    cfg.set_feature_size(feature_size);
    cfg.set_max_depth(4);
    cfg.set_iterations(60);
    cfg.set_shrinkage(0.1);
    cfg.set_data_sample_ratio(1.0);
    cfg.set_feature_sample_ratio(1.0);
    cfg.set_loss("LogLikelyhood");

    let mut training: DataVec = matrix
        .into_iter()
        .zip(labels)
        .map(|(features, &label)| {
            let target = if label == 1 { 1.0 } else { -1.0 };
            Data::new_training_data(features, 1.0, target, None)
        })
        .collect();

    let mut model = GBDT::new(&cfg);
    model.fit(&mut training);
    Ok(model)
}

/// Churn / no-churn counts over a prediction batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictionSummary {
    pub churned_count: usize,
    pub non_churned_count: usize,
}

impl PredictionSummary {
    pub fn from_labels(labels: &[ChurnLabel]) -> Self {
        let churned_count = labels.iter().filter(|&&l| l == ChurnLabel::Churn).count();
        Self {
            churned_count,
            non_churned_count: labels.len() - churned_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn high_risk_row() -> TrainingRow {
        TrainingRow {
            tenure: 1,
            senior_citizen: 0,
            partner: "Yes".into(),
            dependents: "No".into(),
            multiple_lines: "No".into(),
            internet_service: "Fiber optic".into(),
            online_security: "No".into(),
            churn: "Yes".into(),
        }
    }

    fn low_risk_row() -> TrainingRow {
        TrainingRow {
            tenure: 72,
            senior_citizen: 0,
            partner: "Yes".into(),
            dependents: "Yes".into(),
            multiple_lines: "Yes".into(),
            internet_service: "DSL".into(),
            online_security: "Yes".into(),
            churn: "No".into(),
        }
    }

    /// A slightly widened table so the classifier sees each pattern more
    /// than once; predictions on the training rows should reproduce their
    /// labels.
    fn training_table() -> Vec<TrainingRow> {
        let mut rows = Vec::new();
        for _ in 0..8 {
            rows.push(high_risk_row());
            rows.push(low_risk_row());
        }
        rows
    }

    #[test]
    fn two_disjoint_rows_train_and_reproduce_their_labels() {
        let artifact = ChurnArtifact::train(&[high_risk_row(), low_risk_row()]).unwrap();
        let predictions = artifact
            .predict(&[high_risk_row().features(), low_risk_row().features()])
            .unwrap();
        assert_eq!(predictions, vec![ChurnLabel::Churn, ChurnLabel::NoChurn]);
    }

    #[test]
    fn training_rows_reproduce_their_labels() {
        let artifact = ChurnArtifact::train(&training_table()).unwrap();
        let predictions = artifact
            .predict(&[high_risk_row().features(), low_risk_row().features()])
            .unwrap();
        assert_eq!(predictions, vec![ChurnLabel::Churn, ChurnLabel::NoChurn]);
    }

    #[test]
    fn predictions_preserve_input_order() {
        let artifact = ChurnArtifact::train(&training_table()).unwrap();
        let predictions = artifact
            .predict(&[
                low_risk_row().features(),
                high_risk_row().features(),
                low_risk_row().features(),
            ])
            .unwrap();
        assert_eq!(
            predictions,
            vec![ChurnLabel::NoChurn, ChurnLabel::Churn, ChurnLabel::NoChurn]
        );
    }

    #[test]
    fn unknown_label_aborts_training() {
        let mut rows = training_table();
        rows[0].churn = "Perhaps".into();
        let err = ChurnArtifact::train(&rows).unwrap_err();
        assert!(matches!(err, ChurnError::UnknownLabel(v) if v == "Perhaps"));
    }

    #[test]
    fn empty_table_aborts_training() {
        let err = ChurnArtifact::train(&[]).unwrap_err();
        assert!(matches!(err, ChurnError::Training(_)));
    }

    #[test]
    fn row_label_count_mismatch_is_a_training_error() {
        let err = fit_classifier(3, vec![vec![0.0, 1.0, 2.0]], &[1, 0]).err().unwrap();
        assert!(matches!(err, ChurnError::Training(_)));
    }

    #[test]
    fn non_binary_labels_are_a_training_error() {
        let err = fit_classifier(2, vec![vec![0.0, 1.0], vec![1.0, 0.0]], &[0, 2]).err().unwrap();
        assert!(matches!(err, ChurnError::Training(_)));
    }

    #[test]
    fn unseen_category_rejects_the_prediction_batch() {
        let artifact = ChurnArtifact::train(&training_table()).unwrap();
        let mut row = high_risk_row().features();
        row.internet_service = "Carrier pigeon".into();
        let err = artifact.predict(&[row]).unwrap_err();
        assert!(matches!(
            err,
            ChurnError::UnknownCategory { column: "InternetService", .. }
        ));
    }

    #[test]
    fn empty_prediction_batch_yields_empty_output() {
        let artifact = ChurnArtifact::train(&training_table()).unwrap();
        assert!(artifact.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn artifact_roundtrips_through_disk_with_its_encoder() {
        let artifact = ChurnArtifact::train(&training_table()).unwrap();
        let sample = [high_risk_row().features(), low_risk_row().features()];
        let before = artifact.predict(&sample).unwrap();

        let dir = std::env::temp_dir().join("churnwatch-artifact-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("artifact.json");
        artifact.save(&path).unwrap();

        let restored = ChurnArtifact::load(&path).unwrap();
        assert_eq!(restored.predict(&sample).unwrap(), before);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_fails_when_artifact_is_missing() {
        let err = ChurnArtifact::load(Path::new("/nonexistent/artifact.json")).unwrap_err();
        assert!(matches!(err, ChurnError::Io(_)));
    }

    #[test]
    fn summary_counts_are_a_pure_reduction() {
        let labels = [
            ChurnLabel::Churn,
            ChurnLabel::NoChurn,
            ChurnLabel::Churn,
            ChurnLabel::Churn,
        ];
        let summary = PredictionSummary::from_labels(&labels);
        assert_eq!(summary.churned_count, 3);
        assert_eq!(summary.non_churned_count, 1);
        assert_eq!(
            PredictionSummary::from_labels(&[]),
            PredictionSummary {
                churned_count: 0,
                non_churned_count: 0
            }
        );
    }
}
