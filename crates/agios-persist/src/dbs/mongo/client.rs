use agios_types::{Message, MessageFile, MessageUpdate, Thread, ThreadWithMessages, UploadedFile};
use async_trait::async_trait;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    Client, ClientSession,
};

use crate::dbs::mongo::models::{MongoMessage, MongoThread, MongoUploadedFile};
use crate::dbs::mongo::repositories::{
    MongoFileRepository, MongoMessageRepository, MongoThreadRepository,
};
use crate::error::{PersistError, Result};
use crate::trait_client::PersistenceClient;

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &PersistError) -> bool {
    let PersistError::Database(err) = err else {
        return false;
    };
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

pub struct MongoPersistenceClient {
    client: Client,
    thread_repo: MongoThreadRepository,
    message_repo: MongoMessageRepository,
    file_repo: MongoFileRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB, create the client and make sure unique indexes exist.
    ///
    /// Multi-document operations use transactions, so the deployment must be a
    /// replica set (a single-node replica set is enough).
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let thread_repo = MongoThreadRepository::new(&client, database);
        let message_repo = MongoMessageRepository::new(&client, database);
        let file_repo = MongoFileRepository::new(&client, database);

        thread_repo.ensure_indexes().await?;
        message_repo.ensure_indexes().await?;

        tracing::info!(database, "connected to MongoDB");

        Ok(Self {
            client,
            thread_repo,
            message_repo,
            file_repo,
        })
    }

    async fn resolve_files(&self, file_ids: &[String]) -> Result<Vec<UploadedFile>> {
        let found: Vec<UploadedFile> = self
            .file_repo
            .find_many(file_ids)
            .await?
            .into_iter()
            .map(UploadedFile::from)
            .collect();

        file_ids
            .iter()
            .map(|id| {
                found
                    .iter()
                    .find(|f| &f.id == id)
                    .cloned()
                    .ok_or_else(|| PersistError::FileNotFound(id.clone()))
            })
            .collect()
    }

    async fn hydrate(&self, doc: MongoMessage) -> Result<Message> {
        let ids: Vec<String> = doc.file_ids().map(str::to_string).collect();
        let files: Vec<UploadedFile> = self
            .file_repo
            .find_many(&ids)
            .await?
            .into_iter()
            .map(UploadedFile::from)
            .collect();
        Ok(doc.into_message(&files))
    }

    async fn insert_thread_and_message(
        &self,
        thread: &MongoThread,
        message: &MongoMessage,
        session: &mut ClientSession,
    ) -> Result<()> {
        self.thread_repo.insert(thread, session).await?;
        self.message_repo.insert_in(message, session).await?;
        Ok(())
    }

    async fn delete_thread_tree(&self, thread_id: &str, session: &mut ClientSession) -> Result<u64> {
        self.message_repo.delete_for_thread(thread_id, session).await?;
        self.thread_repo.delete(thread_id, session).await
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn create_thread(&self, thread: Thread) -> Result<Thread> {
        let doc = MongoThread::from(thread.clone());
        let mut session = self.client.start_session().await?;
        match self.thread_repo.insert(&doc, &mut session).await {
            Ok(()) => Ok(thread),
            Err(e) if is_duplicate_key(&e) => Err(PersistError::SlugConflict(thread.slug)),
            Err(e) => Err(e),
        }
    }

    async fn create_thread_with_message(
        &self,
        thread: Thread,
        mut message: Message,
        file_ids: &[String],
    ) -> Result<(Thread, Message)> {
        // Uploads are immutable, so they can be resolved before the transaction
        let files = self.resolve_files(file_ids).await?;
        message.thread_id = thread.id.clone();
        message.files = files.into_iter().map(MessageFile::new).collect();

        let thread_doc = MongoThread::from(thread.clone());
        let message_doc = MongoMessage::from(&message);

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let outcome = self
            .insert_thread_and_message(&thread_doc, &message_doc, &mut session)
            .await;
        match outcome {
            Ok(()) => {
                session.commit_transaction().await?;
                tracing::debug!(thread_id = %thread.id, message_id = %message.id, "created thread with first message");
                Ok((thread, message))
            }
            Err(e) => {
                if let Err(abort) = session.abort_transaction().await {
                    tracing::warn!(error = %abort, "failed to abort transaction");
                }
                if is_duplicate_key(&e) {
                    Err(PersistError::SlugConflict(thread.slug))
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn get_thread_by_slug(&self, slug: &str) -> Result<Option<Thread>> {
        Ok(self.thread_repo.get_by_slug(slug).await?.map(Thread::from))
    }

    async fn get_thread_with_messages(&self, thread_id: &str) -> Result<ThreadWithMessages> {
        let thread = self
            .thread_repo
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;

        let docs = self.message_repo.get_messages(thread_id).await?;
        let ids: Vec<String> = docs
            .iter()
            .flat_map(|d| d.file_ids().map(str::to_string))
            .collect();
        let files: Vec<UploadedFile> = self
            .file_repo
            .find_many(&ids)
            .await?
            .into_iter()
            .map(UploadedFile::from)
            .collect();

        Ok(ThreadWithMessages {
            thread: thread.into(),
            messages: docs.into_iter().map(|d| d.into_message(&files)).collect(),
        })
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        match self.delete_thread_tree(thread_id, &mut session).await {
            Ok(0) => {
                session.abort_transaction().await?;
                Err(PersistError::ThreadNotFound(thread_id.to_string()))
            }
            Ok(_) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort) = session.abort_transaction().await {
                    tracing::warn!(error = %abort, "failed to abort transaction");
                }
                Err(e)
            }
        }
    }

    async fn create_message(&self, message: Message) -> Result<Message> {
        if !self.thread_repo.touch(&message.thread_id).await? {
            return Err(PersistError::ThreadNotFound(message.thread_id));
        }
        match self.message_repo.insert(&MongoMessage::from(&message)).await {
            Ok(()) => Ok(message),
            Err(e) if is_duplicate_key(&e) => Err(PersistError::MessageIndexConflict {
                thread_id: message.thread_id,
                index: message.message_index,
            }),
            Err(e) => Err(e),
        }
    }

    async fn get_message(&self, message_id: &str) -> Result<Message> {
        let doc = self
            .message_repo
            .get_message(message_id)
            .await?
            .ok_or_else(|| PersistError::MessageNotFound(message_id.to_string()))?;
        self.hydrate(doc).await
    }

    async fn update_message(&self, message_id: &str, update: MessageUpdate) -> Result<Message> {
        let mut message = self.get_message(message_id).await?;
        if message.is_finalized() {
            return Err(PersistError::MessageFinalized(message_id.to_string()));
        }
        message.apply(update);

        // The filter re-checks the status, so a concurrent finalize wins
        if !self
            .message_repo
            .replace_in_progress(&MongoMessage::from(&message))
            .await?
        {
            return Err(PersistError::MessageFinalized(message_id.to_string()));
        }
        Ok(message)
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        match self.message_repo.delete(message_id).await? {
            0 => Err(PersistError::MessageNotFound(message_id.to_string())),
            _ => Ok(()),
        }
    }

    async fn save_file_metadata(&self, file: UploadedFile) -> Result<()> {
        self.file_repo.insert(&MongoUploadedFile::from(file)).await
    }

    async fn save_files_metadata(&self, files: Vec<UploadedFile>) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        let docs: Vec<MongoUploadedFile> = files.into_iter().map(MongoUploadedFile::from).collect();

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        match self.file_repo.insert_many_in(&docs, &mut session).await {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort) = session.abort_transaction().await {
                    tracing::warn!(error = %abort, "failed to abort transaction");
                }
                Err(e)
            }
        }
    }

    async fn get_files_by_ids(&self, file_ids: &[String]) -> Result<Vec<UploadedFile>> {
        self.resolve_files(file_ids).await
    }
}
