use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::churn::error::ChurnError;

fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, ChurnError> {
    let mut csv = csv::Reader::from_reader(reader);
    // Headers are matched by name; columns outside the schema are dropped.
    let mut rows = Vec::new();
    for record in csv.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Load the labeled training table from disk.
pub fn load_training_csv(path: &Path) -> Result<Vec<crate::churn::row::TrainingRow>, ChurnError> {
    let file = File::open(path)?;
    let rows = read_rows(file)?;
    info!(path = %path.display(), rows = rows.len(), "training data loaded");
    Ok(rows)
}

/// Parse an uploaded, unlabeled CSV into feature rows.
pub fn parse_upload(bytes: &[u8]) -> Result<Vec<crate::churn::row::CustomerRow>, ChurnError> {
    read_rows(bytes)
}
