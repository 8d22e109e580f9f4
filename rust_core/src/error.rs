//! Error types for registry loading.
//!
//! Matching never fails: empty registries, short names and unknown leagues are
//! ordinary low-confidence outcomes. Only a registry that cannot be read or
//! does not carry the required fields is an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry source is missing required fields or has a malformed row.
    #[error("invalid registry schema: {0}")]
    InvalidSchema(String),

    #[error("registry io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("registry json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported registry format: {0}")]
    UnsupportedFormat(String),
}

impl RegistryError {
    pub fn missing_columns(columns: &[&str]) -> Self {
        RegistryError::InvalidSchema(format!("missing required columns: {}", columns.join(", ")))
    }

    pub fn is_schema_error(&self) -> bool {
        matches!(self, RegistryError::InvalidSchema(_))
    }
}
