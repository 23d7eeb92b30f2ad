use serde::{Deserialize, Serialize};

use crate::churn::error::ChurnError;

/// The five categorical feature columns, in encoder order.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "Partner",
    "Dependents",
    "MultipleLines",
    "InternetService",
    "OnlineSecurity",
];

/// One customer to score: the fixed 7-field feature schema.
///
/// Field names mirror the training CSV's headers; a row is built either from
/// an uploaded CSV record or from a JSON request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRow {
    pub tenure: u32,
    #[serde(rename = "SeniorCitizen")]
    pub senior_citizen: u8,
    #[serde(rename = "Partner")]
    pub partner: String,
    #[serde(rename = "Dependents")]
    pub dependents: String,
    #[serde(rename = "MultipleLines")]
    pub multiple_lines: String,
    #[serde(rename = "InternetService")]
    pub internet_service: String,
    #[serde(rename = "OnlineSecurity")]
    pub online_security: String,
}

impl CustomerRow {
    /// Categorical values paired with their column names, in encoder order.
    pub fn categoricals(&self) -> [(&'static str, &str); 5] {
        [
            ("Partner", self.partner.as_str()),
            ("Dependents", self.dependents.as_str()),
            ("MultipleLines", self.multiple_lines.as_str()),
            ("InternetService", self.internet_service.as_str()),
            ("OnlineSecurity", self.online_security.as_str()),
        ]
    }
}

/// A training record: features plus the raw churn label.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingRow {
    pub tenure: u32,
    #[serde(rename = "SeniorCitizen")]
    pub senior_citizen: u8,
    #[serde(rename = "Partner")]
    pub partner: String,
    #[serde(rename = "Dependents")]
    pub dependents: String,
    #[serde(rename = "MultipleLines")]
    pub multiple_lines: String,
    #[serde(rename = "InternetService")]
    pub internet_service: String,
    #[serde(rename = "OnlineSecurity")]
    pub online_security: String,
    #[serde(rename = "Churn")]
    pub churn: String,
}

impl TrainingRow {
    pub fn features(&self) -> CustomerRow {
        CustomerRow {
            tenure: self.tenure,
            senior_citizen: self.senior_citizen,
            partner: self.partner.clone(),
            dependents: self.dependents.clone(),
            multiple_lines: self.multiple_lines.clone(),
            internet_service: self.internet_service.clone(),
            online_security: self.online_security.clone(),
        }
    }

    /// Fixed, exhaustive label mapping: "Yes" -> 1, "No" -> 0.
    pub fn label(&self) -> Result<u8, ChurnError> {
        match self.churn.as_str() {
            "Yes" => Ok(1),
            "No" => Ok(0),
            other => Err(ChurnError::UnknownLabel(other.to_string())),
        }
    }
}

/// Binary outcome of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChurnLabel {
    Churn,
    NoChurn,
}

impl ChurnLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChurnLabel::Churn => "Customer Will Churn",
            ChurnLabel::NoChurn => "Customer Will Not Churn",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_row(churn: &str) -> TrainingRow {
        TrainingRow {
            tenure: 12,
            senior_citizen: 0,
            partner: "Yes".into(),
            dependents: "No".into(),
            multiple_lines: "No".into(),
            internet_service: "DSL".into(),
            online_security: "Yes".into(),
            churn: churn.into(),
        }
    }

    #[test]
    fn label_mapping_is_fixed_and_exhaustive() {
        assert_eq!(training_row("Yes").label().unwrap(), 1);
        assert_eq!(training_row("No").label().unwrap(), 0);
        let err = training_row("Maybe").label().unwrap_err();
        assert!(matches!(err, ChurnError::UnknownLabel(v) if v == "Maybe"));
    }

    #[test]
    fn categoricals_follow_encoder_column_order() {
        let row = training_row("No").features();
        let names: Vec<_> = row.categoricals().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, CATEGORICAL_COLUMNS);
    }
}
