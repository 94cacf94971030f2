use futures::TryStreamExt;
use mongodb::{bson::doc, Client, ClientSession, Collection};

use crate::dbs::mongo::models::MongoUploadedFile;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoFileRepository {
    collection: Collection<MongoUploadedFile>,
}

impl MongoFileRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("upload_files");
        Self { collection }
    }

    pub async fn insert(&self, file: &MongoUploadedFile) -> Result<()> {
        self.collection.insert_one(file).await?;
        Ok(())
    }

    pub async fn insert_many_in(
        &self,
        files: &[MongoUploadedFile],
        session: &mut ClientSession,
    ) -> Result<()> {
        self.collection.insert_many(files).session(session).await?;
        Ok(())
    }

    /// Files whose id is in `file_ids`; unknown ids are simply absent
    pub async fn find_many(&self, file_ids: &[String]) -> Result<Vec<MongoUploadedFile>> {
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }
        let files = self
            .collection
            .find(doc! { "_id": { "$in": file_ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(files)
    }
}
