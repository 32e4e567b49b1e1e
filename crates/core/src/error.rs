use guidebook_types::TextError;

#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to remove record: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error("store write lock was poisoned")]
    LockPoisoned,
}

impl From<TextError> for GuideError {
    fn from(e: TextError) -> Self {
        GuideError::InvalidInput(e.to_string())
    }
}

pub type GuideResult<T> = std::result::Result<T, GuideError>;
