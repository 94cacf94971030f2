use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version tag stamped on every persisted record
pub const RECORD_VERSION: &str = "1.0";

/// Maximum number of files a single message may reference
pub const MAX_FILES_PER_MESSAGE: usize = 5;

/// Maximum accepted upload size (10 MiB)
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// A conversation identified by a unique, content-derived slug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: String,
}

impl Thread {
    pub fn new(slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            slug: slug.into(),
            created_at: now,
            updated_at: now,
            version: RECORD_VERSION.to_string(),
        }
    }
}

/// A thread together with its messages, ordered by `message_index`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadWithMessages {
    #[serde(flatten)]
    pub thread: Thread,
    pub messages: Vec<Message>,
}

/// Persisted event type of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Start,
    Plan,
    WebResults,
    MarkdownAnswer,
    RelatedQueries,
    Widget,
    End,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Plan => "PLAN",
            Self::WebResults => "WEB_RESULTS",
            Self::MarkdownAnswer => "MARKDOWN_ANSWER",
            Self::RelatedQueries => "RELATED_QUERIES",
            Self::Widget => "WIDGET",
            Self::End => "END",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamStatus {
    InProgress,
    Done,
    Failed,
}

impl StreamStatus {
    /// DONE and FAILED messages are immutable
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// One query/response exchange within a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub message_index: u32,
    pub query_text: Option<String>,
    pub response_text: Option<String>,
    pub event_type: EventType,
    pub stream_status: StreamStatus,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// Seconds spent producing the response
    pub response_time: f64,
    #[serde(default = "empty_metadata")]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub version: String,
    #[serde(default)]
    pub files: Vec<MessageFile>,
}

fn empty_metadata() -> serde_json::Value {
    serde_json::json!({})
}

impl Message {
    /// First message of a freshly created thread.
    ///
    /// Token and latency fields start at zero and are filled in when the
    /// pipeline finalizes the message.
    pub fn initial(thread_id: impl Into<String>, query_text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            message_index: 0,
            query_text: Some(query_text.into()),
            response_text: None,
            event_type: EventType::Start,
            stream_status: StreamStatus::InProgress,
            model: model.into(),
            input_tokens: 0,
            output_tokens: 0,
            response_time: 0.0,
            metadata: empty_metadata(),
            created_at: Utc::now(),
            version: RECORD_VERSION.to_string(),
            files: Vec::new(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.stream_status.is_terminal()
    }

    pub fn file_ids(&self) -> Vec<String> {
        self.files.iter().map(|f| f.file.id.clone()).collect()
    }

    /// Apply the non-empty fields of `update` in place
    pub fn apply(&mut self, update: MessageUpdate) {
        if let Some(text) = update.response_text {
            self.response_text = Some(text);
        }
        if let Some(event_type) = update.event_type {
            self.event_type = event_type;
        }
        if let Some(status) = update.stream_status {
            self.stream_status = status;
        }
        if let Some(metadata) = update.metadata {
            self.metadata = metadata;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(tokens) = update.input_tokens {
            self.input_tokens = tokens;
        }
        if let Some(tokens) = update.output_tokens {
            self.output_tokens = tokens;
        }
        if let Some(seconds) = update.response_time {
            self.response_time = seconds;
        }
    }
}

/// Mutable summary fields of a message that is still streaming
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageUpdate {
    pub response_text: Option<String>,
    pub event_type: Option<EventType>,
    pub stream_status: Option<StreamStatus>,
    pub metadata: Option<serde_json::Value>,
    pub model: Option<String>,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub response_time: Option<f64>,
}

impl MessageUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response_text(mut self, text: impl Into<String>) -> Self {
        self.response_text = Some(text.into());
        self
    }

    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn stream_status(mut self, status: StreamStatus) -> Self {
        self.stream_status = Some(status);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn tokens(mut self, input: u32, output: u32) -> Self {
        self.input_tokens = Some(input);
        self.output_tokens = Some(output);
        self
    }

    pub fn response_time(mut self, seconds: f64) -> Self {
        self.response_time = Some(seconds);
        self
    }
}

/// Metadata for a stored upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    /// Storage name: `<uuid><original extension>`
    pub file_name: String,
    pub original_file_name: String,
    pub file_size_bytes: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub version: String,
}

/// Association row between a message and an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageFile {
    pub file: UploadedFile,
    pub attached_at: DateTime<Utc>,
}

impl MessageFile {
    pub fn new(file: UploadedFile) -> Self {
        Self {
            file,
            attached_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_message_defaults() {
        let msg = Message::initial("t1", "weather in Rome", "gemini-1.5-flash");

        assert_eq!(msg.message_index, 0);
        assert_eq!(msg.event_type, EventType::Start);
        assert_eq!(msg.stream_status, StreamStatus::InProgress);
        assert_eq!(msg.metadata, serde_json::json!({}));
        assert_eq!(msg.input_tokens, 0);
        assert!(!msg.is_finalized());
    }

    #[test]
    fn test_apply_update_only_touches_set_fields() {
        let mut msg = Message::initial("t1", "hello", "m");
        msg.apply(
            MessageUpdate::new()
                .response_text("hi there")
                .stream_status(StreamStatus::Done)
                .tokens(12, 34),
        );

        assert_eq!(msg.response_text.as_deref(), Some("hi there"));
        assert_eq!(msg.stream_status, StreamStatus::Done);
        assert_eq!(msg.event_type, EventType::Start);
        assert_eq!((msg.input_tokens, msg.output_tokens), (12, 34));
        assert!(msg.is_finalized());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_value(EventType::MarkdownAnswer).unwrap(),
            serde_json::json!("MARKDOWN_ANSWER")
        );
        assert_eq!(
            serde_json::to_value(StreamStatus::InProgress).unwrap(),
            serde_json::json!("IN_PROGRESS")
        );
        assert_eq!(EventType::WebResults.to_string(), "WEB_RESULTS");
    }
}
