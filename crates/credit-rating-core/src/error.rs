use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreditRatingError {
    #[error("Invalid configuration in {table}: {reason}")]
    InvalidConfig { table: String, reason: String },

    #[error("Unknown rating grade '{grade}'")]
    UnknownGrade { grade: String },

    #[error("Score {score} did not match any rating band")]
    ScoreOutOfBands { score: Decimal },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CreditRatingError {
    fn from(e: serde_json::Error) -> Self {
        CreditRatingError::SerializationError(e.to_string())
    }
}
