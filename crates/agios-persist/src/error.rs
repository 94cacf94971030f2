use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Thread already exists: {0}")]
    SlugConflict(String),

    #[error("Message index {index} already used in thread {thread_id}")]
    MessageIndexConflict { thread_id: String, index: u32 },

    #[error("Message is finalized and can no longer change: {0}")]
    MessageFinalized(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistError {
    /// True for the "record does not exist" family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ThreadNotFound(_) | Self::MessageNotFound(_) | Self::FileNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
