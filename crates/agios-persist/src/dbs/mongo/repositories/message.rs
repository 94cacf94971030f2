use futures::TryStreamExt;
use mongodb::{
    bson::doc, options::IndexOptions, Client, ClientSession, Collection, IndexModel,
};

use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    /// One message per (thread, index) pair
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "thread_id": 1, "message_index": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    pub async fn insert(&self, message: &MongoMessage) -> Result<()> {
        self.collection.insert_one(message).await?;
        Ok(())
    }

    pub async fn insert_in(&self, message: &MongoMessage, session: &mut ClientSession) -> Result<()> {
        self.collection.insert_one(message).session(session).await?;
        Ok(())
    }

    pub async fn get_message(&self, message_id: &str) -> Result<Option<MongoMessage>> {
        Ok(self.collection.find_one(doc! { "_id": message_id }).await?)
    }

    /// Messages of a thread in creation order
    pub async fn get_messages(&self, thread_id: &str) -> Result<Vec<MongoMessage>> {
        let messages = self
            .collection
            .find(doc! { "thread_id": thread_id })
            .sort(doc! { "message_index": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }

    /// Replace the document only while it is still streaming.
    /// Returns false when no in-progress document matched.
    pub async fn replace_in_progress(&self, message: &MongoMessage) -> Result<bool> {
        let filter = doc! {
            "_id": message.id.as_str(),
            "stream_status": { "$nin": ["DONE", "FAILED"] },
        };
        let result = self.collection.replace_one(filter, message).await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete(&self, message_id: &str) -> Result<u64> {
        let result = self.collection.delete_one(doc! { "_id": message_id }).await?;
        Ok(result.deleted_count)
    }

    pub async fn delete_for_thread(&self, thread_id: &str, session: &mut ClientSession) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "thread_id": thread_id })
            .session(session)
            .await?;
        Ok(result.deleted_count)
    }
}
