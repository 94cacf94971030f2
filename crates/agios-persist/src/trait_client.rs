use agios_types::{Message, MessageUpdate, Thread, ThreadWithMessages, UploadedFile};
use async_trait::async_trait;

use crate::error::Result;

/// Trait for database persistence operations
///
/// Implementations provide database-specific CRUD operations. Missing records
/// surface as the `*NotFound` variants of `PersistError`, never as a generic
/// database failure.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create a thread on its own (slug must be unused)
    async fn create_thread(&self, thread: Thread) -> Result<Thread>;

    /// Atomically create a thread, its first message and the message's file
    /// associations. Nothing is written if any part fails.
    async fn create_thread_with_message(
        &self,
        thread: Thread,
        message: Message,
        file_ids: &[String],
    ) -> Result<(Thread, Message)>;

    async fn get_thread_by_slug(&self, slug: &str) -> Result<Option<Thread>>;

    /// Thread plus its messages ordered by creation (`message_index`)
    async fn get_thread_with_messages(&self, thread_id: &str) -> Result<ThreadWithMessages>;

    /// Delete a thread, cascading to its messages and their file associations
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// Append a message to an existing thread
    async fn create_message(&self, message: Message) -> Result<Message>;

    async fn get_message(&self, message_id: &str) -> Result<Message>;

    /// Update the summary fields of a message that is not yet DONE/FAILED
    async fn update_message(&self, message_id: &str, update: MessageUpdate) -> Result<Message>;

    async fn delete_message(&self, message_id: &str) -> Result<()>;

    async fn save_file_metadata(&self, file: UploadedFile) -> Result<()>;

    /// Save the metadata of one upload batch; either every record is stored
    /// or none is
    async fn save_files_metadata(&self, files: Vec<UploadedFile>) -> Result<()>;

    /// Resolve every ID, in input order; any unknown ID fails the call
    async fn get_files_by_ids(&self, file_ids: &[String]) -> Result<Vec<UploadedFile>>;
}
