use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReceiptError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prediction service error: {message}")]
    Api { message: String },

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error(transparent)]
    Structural(#[from] ParseFailure),
}

/// The prediction payload is not shaped as expected at all and no expense
/// record can be constructed. Field-level problems never land here; they
/// degrade to `Warning`s on an otherwise-built record.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("prediction payload is not structured as expected: {reason}")]
pub struct ParseFailure {
    pub reason: String,
    /// The offending fragment of the raw payload, kept for diagnostics.
    pub fragment: serde_json::Value,
}

impl ParseFailure {
    pub fn new(reason: impl Into<String>, fragment: serde_json::Value) -> Self {
        Self {
            reason: reason.into(),
            fragment,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReceiptError>;
