use mongodb::{
    bson::doc, options::IndexOptions, Client, ClientSession, Collection, IndexModel,
};

use crate::dbs::mongo::models::MongoThread;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    /// Unique slug index; duplicate inserts fail with code 11000
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "slug": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    pub async fn insert(&self, thread: &MongoThread, session: &mut ClientSession) -> Result<()> {
        self.collection.insert_one(thread).session(session).await?;
        Ok(())
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<MongoThread>> {
        Ok(self.collection.find_one(doc! { "_id": thread_id }).await?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<MongoThread>> {
        Ok(self.collection.find_one(doc! { "slug": slug }).await?)
    }

    /// Bump `updated_at`; returns false when the thread does not exist
    pub async fn touch(&self, thread_id: &str) -> Result<bool> {
        // Same encoding serde uses for the chrono field on insert
        let now = bson::to_bson(&chrono::Utc::now())?;
        let result = self
            .collection
            .update_one(doc! { "_id": thread_id }, doc! { "$set": { "updated_at": now } })
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Returns the number of deleted documents (0 or 1)
    pub async fn delete(&self, thread_id: &str, session: &mut ClientSession) -> Result<u64> {
        let result = self
            .collection
            .delete_one(doc! { "_id": thread_id })
            .session(session)
            .await?;
        Ok(result.deleted_count)
    }
}
