use thiserror::Error;

#[derive(Error, Debug)]
pub enum LmsError {
    #[error("Webhook authentication failed: {0}")]
    Authentication(String),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
}

impl LmsError {
    /// Whether the provider should redeliver the event that produced this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            LmsError::Authentication(_) | LmsError::MalformedPayload(_) | LmsError::ValidationError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LmsError>;
