use thiserror::Error;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("card record {index} has no usable name: {reason}")]
    MalformedEntry { index: usize, reason: String },
    #[error("failed to read bulk data: {0}")]
    Io(#[source] std::io::Error),
    #[error("bulk data JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
