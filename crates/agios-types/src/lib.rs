pub mod events;
pub mod models;
pub mod text;

pub use events::{StreamEvent, ERROR_EVENT};
pub use models::{
    EventType, Message, MessageFile, MessageUpdate, StreamStatus, Thread, ThreadWithMessages,
    UploadedFile, MAX_FILES_PER_MESSAGE, MAX_FILE_SIZE_BYTES, RECORD_VERSION,
};
