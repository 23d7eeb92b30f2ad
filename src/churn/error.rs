use thiserror::Error;

/// Failures of the churn pipeline, from CSV intake through prediction.
#[derive(Debug, Error)]
pub enum ChurnError {
    /// A training row carried a label other than "Yes"/"No". Fatal to the
    /// training run; nothing is persisted.
    #[error("unknown label {0:?}, expected \"Yes\" or \"No\"")]
    UnknownLabel(String),

    /// A prediction row carried a categorical value never seen at fit time.
    /// The batch is rejected rather than silently zero-encoded.
    #[error("unknown category {value:?} in column {column}")]
    UnknownCategory {
        column: &'static str,
        value: String,
    },

    #[error("training failed: {0}")]
    Training(String),

    /// Prediction requested while no artifact exists.
    #[error("model is not trained")]
    NotTrained,

    #[error("invalid dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("artifact serialization: {0}")]
    Serde(#[from] serde_json::Error),
}
