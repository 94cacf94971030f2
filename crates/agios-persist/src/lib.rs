pub mod dbs;
pub mod error;
pub mod storage;
pub mod trait_client;

pub use dbs::InMemoryPersistenceClient;
#[cfg(feature = "mongodb")]
pub use dbs::MongoPersistenceClient;
pub use error::{PersistError, Result};
pub use storage::{FileStore, LocalFileStore};
pub use trait_client::PersistenceClient;
