/// Error type shared by the cache, the encoder and the decode timer
///
/// Every failure that can happen while benchmarking lands here. None of
/// them are fatal: the measurement routine turns them into absent values
/// and the batch procedures only log them.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    /// The persistent store could not be opened in this environment
    #[error("cache store is not available")]
    CacheUnavailable,

    #[error("cache query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("not a base64 data URL")]
    InvalidDataUrl,

    /// The preview reference was revoked (or never issued)
    #[error("preview reference {0} is no longer valid")]
    PreviewRevoked(u64),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;
