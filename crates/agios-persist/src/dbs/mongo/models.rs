use agios_types::{
    EventType, Message, MessageFile, StreamStatus, Thread, UploadedFile,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MongoDB-specific Thread document (`_id` is the thread UUID)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: String,
}

/// Message/file association embedded in the message document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoFileRef {
    pub file_id: String,
    pub attached_at: DateTime<Utc>,
}

/// MongoDB-specific Message document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub thread_id: String,
    pub message_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    pub event_type: EventType,
    pub stream_status: StreamStatus,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub response_time: f64,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub version: String,
    #[serde(default)]
    pub files: Vec<MongoFileRef>,
}

/// MongoDB-specific upload metadata document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUploadedFile {
    #[serde(rename = "_id")]
    pub id: String,
    pub file_name: String,
    pub original_file_name: String,
    pub file_size_bytes: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub version: String,
}

impl From<Thread> for MongoThread {
    fn from(thread: Thread) -> Self {
        Self {
            id: thread.id,
            slug: thread.slug,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
            version: thread.version,
        }
    }
}

impl From<MongoThread> for Thread {
    fn from(thread: MongoThread) -> Self {
        Self {
            id: thread.id,
            slug: thread.slug,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
            version: thread.version,
        }
    }
}

impl From<&Message> for MongoMessage {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id.clone(),
            thread_id: msg.thread_id.clone(),
            message_index: msg.message_index,
            query_text: msg.query_text.clone(),
            response_text: msg.response_text.clone(),
            event_type: msg.event_type,
            stream_status: msg.stream_status,
            model: msg.model.clone(),
            input_tokens: msg.input_tokens,
            output_tokens: msg.output_tokens,
            response_time: msg.response_time,
            metadata: msg.metadata.clone(),
            created_at: msg.created_at,
            version: msg.version.clone(),
            files: msg
                .files
                .iter()
                .map(|f| MongoFileRef {
                    file_id: f.file.id.clone(),
                    attached_at: f.attached_at,
                })
                .collect(),
        }
    }
}

impl MongoMessage {
    /// Rebuild the domain message; `files` must hold the resolved uploads
    /// referenced by `self.files`, in any order.
    pub fn into_message(self, files: &[UploadedFile]) -> Message {
        let attached = self
            .files
            .iter()
            .filter_map(|r| {
                files.iter().find(|f| f.id == r.file_id).map(|f| MessageFile {
                    file: f.clone(),
                    attached_at: r.attached_at,
                })
            })
            .collect();

        Message {
            id: self.id,
            thread_id: self.thread_id,
            message_index: self.message_index,
            query_text: self.query_text,
            response_text: self.response_text,
            event_type: self.event_type,
            stream_status: self.stream_status,
            model: self.model,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            response_time: self.response_time,
            metadata: self.metadata,
            created_at: self.created_at,
            version: self.version,
            files: attached,
        }
    }

    pub fn file_ids(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.file_id.as_str())
    }
}

impl From<UploadedFile> for MongoUploadedFile {
    fn from(file: UploadedFile) -> Self {
        Self {
            id: file.id,
            file_name: file.file_name,
            original_file_name: file.original_file_name,
            file_size_bytes: file.file_size_bytes,
            mime_type: file.mime_type,
            uploaded_at: file.uploaded_at,
            version: file.version,
        }
    }
}

impl From<MongoUploadedFile> for UploadedFile {
    fn from(file: MongoUploadedFile) -> Self {
        Self {
            id: file.id,
            file_name: file.file_name,
            original_file_name: file.original_file_name,
            file_size_bytes: file.file_size_bytes,
            mime_type: file.mime_type,
            uploaded_at: file.uploaded_at,
            version: file.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agios_types::RECORD_VERSION;

    #[test]
    fn test_message_round_trip_keeps_file_links() {
        let file = UploadedFile {
            id: "f1".to_string(),
            file_name: "f1.png".to_string(),
            original_file_name: "cat.png".to_string(),
            file_size_bytes: 3,
            mime_type: "image/png".to_string(),
            uploaded_at: Utc::now(),
            version: RECORD_VERSION.to_string(),
        };
        let mut message = Message::initial("t1", "what is this", "m");
        message.files.push(MessageFile::new(file.clone()));

        let doc = MongoMessage::from(&message);
        assert_eq!(doc.file_ids().collect::<Vec<_>>(), vec!["f1"]);

        let back = doc.into_message(&[file]);
        assert_eq!(back, message);
    }
}
