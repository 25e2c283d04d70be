use thiserror::Error;

/// Custom error type for Vestra operations.
#[derive(Debug, Error)]
pub enum VestraError {
    /// Catalog store operation failed (connectivity, query execution).
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Requested product was not found.
    #[error("Product not found: '{id}'")]
    NotFound { id: String },

    /// Product exists but has no style embedding yet.
    #[error("Product '{id}' has no style embedding (run the fusion batch first)")]
    MissingEmbedding { id: String },

    /// A stored style embedding is malformed or has the wrong dimensionality.
    #[error("Invalid style embedding for '{id}': {reason}")]
    InvalidEmbedding { id: String, reason: String },

    /// Fetching or decoding a product image failed.
    #[error("Image fetch failed: {0}")]
    ImageFetch(String),

    /// Encoder model load or inference failed.
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for VestraError {
    fn from(err: surrealdb::Error) -> Self {
        VestraError::Catalog(err.to_string())
    }
}

impl From<serde_json::Error> for VestraError {
    fn from(err: serde_json::Error) -> Self {
        VestraError::Catalog(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for VestraError {
    fn from(err: std::io::Error) -> Self {
        VestraError::Catalog(format!("I/O error: {}", err))
    }
}

impl From<reqwest::Error> for VestraError {
    fn from(err: reqwest::Error) -> Self {
        VestraError::ImageFetch(err.to_string())
    }
}
