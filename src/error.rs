//! Request-level error taxonomy.
//!
//! Internals use `anyhow`; this enum only exists at the response boundary so
//! each failure maps to one HTTP status. Generative fallback failures never
//! reach it: they degrade the aggregation instead.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroceryError {
    /// Malformed or missing request input.
    #[error("{0}")]
    Validation(String),
    /// Row store or other required upstream failed.
    #[error("upstream failure: {0:#}")]
    Upstream(anyhow::Error),
}

impl GroceryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Upstream(_) => 500,
        }
    }
}

impl From<anyhow::Error> for GroceryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Upstream(err)
    }
}
