use thiserror::Error;

/// Rejection of a call before anything is sent to the file service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Document manager is read-only")]
    ReadOnly,

    #[error("Page must be at least 1")]
    InvalidPage,

    #[error("Limit must be greater than 0")]
    InvalidLimit,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
