use std::collections::HashMap;

use agios_types::{Message, MessageFile, MessageUpdate, Thread, ThreadWithMessages, UploadedFile};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::trait_client::PersistenceClient;

#[derive(Default)]
struct Tables {
    threads: HashMap<String, Thread>,
    /// slug -> thread id
    slugs: HashMap<String, String>,
    messages: HashMap<String, Message>,
    files: HashMap<String, UploadedFile>,
}

impl Tables {
    fn resolve_files(&self, file_ids: &[String]) -> Result<Vec<UploadedFile>> {
        file_ids
            .iter()
            .map(|id| {
                self.files
                    .get(id)
                    .cloned()
                    .ok_or_else(|| PersistError::FileNotFound(id.clone()))
            })
            .collect()
    }

    fn index_taken(&self, thread_id: &str, index: u32) -> bool {
        self.messages
            .values()
            .any(|m| m.thread_id == thread_id && m.message_index == index)
    }
}

/// Process-local store guarded by a single lock.
///
/// Every write takes the write half of the lock for its whole duration, so
/// multi-record operations are atomic with respect to other callers.
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    tables: RwLock<Tables>,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn create_thread(&self, thread: Thread) -> Result<Thread> {
        let mut tables = self.tables.write().await;
        if tables.slugs.contains_key(&thread.slug) {
            return Err(PersistError::SlugConflict(thread.slug));
        }
        tables.slugs.insert(thread.slug.clone(), thread.id.clone());
        tables.threads.insert(thread.id.clone(), thread.clone());
        Ok(thread)
    }

    async fn create_thread_with_message(
        &self,
        thread: Thread,
        mut message: Message,
        file_ids: &[String],
    ) -> Result<(Thread, Message)> {
        let mut tables = self.tables.write().await;

        // Validate everything before the first insert
        if tables.slugs.contains_key(&thread.slug) {
            return Err(PersistError::SlugConflict(thread.slug));
        }
        let files = tables.resolve_files(file_ids)?;

        message.thread_id = thread.id.clone();
        message.files = files.into_iter().map(MessageFile::new).collect();

        tables.slugs.insert(thread.slug.clone(), thread.id.clone());
        tables.threads.insert(thread.id.clone(), thread.clone());
        tables.messages.insert(message.id.clone(), message.clone());

        tracing::debug!(thread_id = %thread.id, message_id = %message.id, "created thread with first message");
        Ok((thread, message))
    }

    async fn get_thread_by_slug(&self, slug: &str) -> Result<Option<Thread>> {
        let tables = self.tables.read().await;
        Ok(tables
            .slugs
            .get(slug)
            .and_then(|id| tables.threads.get(id))
            .cloned())
    }

    async fn get_thread_with_messages(&self, thread_id: &str) -> Result<ThreadWithMessages> {
        let tables = self.tables.read().await;
        let thread = tables
            .threads
            .get(thread_id)
            .cloned()
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;

        let mut messages: Vec<Message> = tables
            .messages
            .values()
            .filter(|m| m.thread_id == thread_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.message_index);

        Ok(ThreadWithMessages { thread, messages })
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let thread = tables
            .threads
            .remove(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        tables.slugs.remove(&thread.slug);
        // File associations live on the message rows and go with them
        tables.messages.retain(|_, m| m.thread_id != thread_id);
        Ok(())
    }

    async fn create_message(&self, message: Message) -> Result<Message> {
        let mut tables = self.tables.write().await;
        if !tables.threads.contains_key(&message.thread_id) {
            return Err(PersistError::ThreadNotFound(message.thread_id));
        }
        if tables.index_taken(&message.thread_id, message.message_index) {
            return Err(PersistError::MessageIndexConflict {
                thread_id: message.thread_id,
                index: message.message_index,
            });
        }
        if let Some(thread) = tables.threads.get_mut(&message.thread_id) {
            thread.updated_at = Utc::now();
        }
        tables.messages.insert(message.id.clone(), message.clone());
        Ok(message)
    }

    async fn get_message(&self, message_id: &str) -> Result<Message> {
        let tables = self.tables.read().await;
        tables
            .messages
            .get(message_id)
            .cloned()
            .ok_or_else(|| PersistError::MessageNotFound(message_id.to_string()))
    }

    async fn update_message(&self, message_id: &str, update: MessageUpdate) -> Result<Message> {
        let mut tables = self.tables.write().await;
        let message = tables
            .messages
            .get_mut(message_id)
            .ok_or_else(|| PersistError::MessageNotFound(message_id.to_string()))?;
        if message.is_finalized() {
            return Err(PersistError::MessageFinalized(message_id.to_string()));
        }
        message.apply(update);
        Ok(message.clone())
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .messages
            .remove(message_id)
            .map(|_| ())
            .ok_or_else(|| PersistError::MessageNotFound(message_id.to_string()))
    }

    async fn save_file_metadata(&self, file: UploadedFile) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.files.insert(file.id.clone(), file);
        Ok(())
    }

    async fn save_files_metadata(&self, files: Vec<UploadedFile>) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .files
            .extend(files.into_iter().map(|file| (file.id.clone(), file)));
        Ok(())
    }

    async fn get_files_by_ids(&self, file_ids: &[String]) -> Result<Vec<UploadedFile>> {
        self.tables.read().await.resolve_files(file_ids)
    }
}
