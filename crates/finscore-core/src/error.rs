use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinScoreError {
    #[error("Missing data for {company} ({period}): {reason}")]
    MissingData {
        company: String,
        period: String,
        reason: String,
    },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {field} — {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Projection sink rejected year {year}: {reason}")]
    Sink { year: i32, reason: String },
}

impl FinScoreError {
    pub fn missing(company: &str, period: impl std::fmt::Display, reason: &str) -> Self {
        FinScoreError::MissingData {
            company: company.to_string(),
            period: period.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for FinScoreError {
    fn from(e: serde_json::Error) -> Self {
        FinScoreError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for FinScoreError {
    fn from(e: serde_yaml::Error) -> Self {
        FinScoreError::Serialization(e.to_string())
    }
}
