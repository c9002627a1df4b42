//! Error types for routekit

use thiserror::Error;

/// Core errors for identifiers and configuration
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid percentage {numerator}/{denominator}")]
    InvalidPercentage { numerator: u64, denominator: u64 },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias for routekit core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::InvalidPercentage { .. } => "invalid_percentage",
        }
    }
}
