pub mod file;
pub mod message;
pub mod thread;

pub use file::MongoFileRepository;
pub use message::MongoMessageRepository;
pub use thread::MongoThreadRepository;
