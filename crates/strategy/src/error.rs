use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("Insufficient data for {0}")]
    InsufficientData(String),

    #[error("No valid JSON found in AI response")]
    NoJsonFound,

    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),

    #[error("Missing field `{0}` in AI response")]
    MissingField(&'static str),

    #[error("Invalid value for `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Decision is for {got}, requested {expected}")]
    StockMismatch { expected: String, got: String },

    #[error("Error getting trade decision: {0}")]
    Inference(String),
}
