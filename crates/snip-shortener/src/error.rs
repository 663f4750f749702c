use snip_core::{ShortCode, StorageError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid owner: {0}")]
    InvalidOwner(String),
    #[error("short code already exists: {0}")]
    Conflict(ShortCode),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
