use serde::{Deserialize, Serialize};

use crate::churn::error::ChurnError;
use crate::churn::row::{CustomerRow, CATEGORICAL_COLUMNS};

/// One-hot encoder fitted on the training table.
///
/// Each categorical column gets a block of indicator columns, one per
/// category observed at fit time (sorted for a deterministic layout); the
/// numeric fields pass through after the blocks. The vocabulary is learned
/// exactly once and travels inside the persisted artifact, so prediction can
/// never re-derive it from its own input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<ColumnVocab>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ColumnVocab {
    name: String,
    categories: Vec<String>, // sorted, deduplicated
}

impl OneHotEncoder {
    /// Learn per-column vocabularies from the training rows.
    pub fn fit(rows: &[CustomerRow]) -> Self {
        let columns = CATEGORICAL_COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut categories: Vec<String> = rows
                    .iter()
                    .map(|r| r.categoricals()[idx].1.to_string())
                    .collect();
                categories.sort();
                categories.dedup();
                ColumnVocab {
                    name: name.to_string(),
                    categories,
                }
            })
            .collect();
        Self { columns }
    }

    /// Width of the encoded feature vector: indicator blocks plus the two
    /// numeric passthrough columns (SeniorCitizen, tenure).
    pub fn width(&self) -> usize {
        self.columns.iter().map(|c| c.categories.len()).sum::<usize>() + 2
    }

    /// Encode one row against the fitted vocabulary.
    ///
    /// A categorical value never seen at fit time rejects the row; unseen
    /// values are not silently zero-encoded.
    pub fn transform(&self, row: &CustomerRow) -> Result<Vec<f32>, ChurnError> {
        let mut features = Vec::with_capacity(self.width());
        for (idx, (column, value)) in row.categoricals().into_iter().enumerate() {
            let vocab = &self.columns[idx];
            let position = vocab
                .categories
                .binary_search_by(|c| c.as_str().cmp(value))
                .map_err(|_| ChurnError::UnknownCategory {
                    column,
                    value: value.to_string(),
                })?;
            for slot in 0..vocab.categories.len() {
                features.push(if slot == position { 1.0 } else { 0.0 });
            }
        }
        features.push(row.senior_citizen as f32);
        features.push(row.tenure as f32);
        Ok(features)
    }

    /// Map an encoded vector's indicator blocks back to category values.
    ///
    /// Inverse of `transform` over the categorical part; used to check the
    /// fit/transform pairing.
    pub fn decode(&self, features: &[f32]) -> Option<Vec<(&str, &str)>> {
        let mut offset = 0;
        let mut decoded = Vec::with_capacity(self.columns.len());
        for vocab in &self.columns {
            let block = features.get(offset..offset + vocab.categories.len())?;
            let hot = block.iter().position(|&v| v == 1.0)?;
            decoded.push((vocab.name.as_str(), vocab.categories[hot].as_str()));
            offset += vocab.categories.len();
        }
        Some(decoded)
    }
}
