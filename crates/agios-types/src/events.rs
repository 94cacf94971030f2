use serde_json::{json, Value};

use crate::models::EventType;

/// Wire name of the in-band failure event
pub const ERROR_EVENT: &str = "ERROR";

/// Events emitted by the thread pipeline, in the order they are issued.
///
/// Each variant maps onto one `event: <NAME>` / `data: <JSON>` frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Start {
        thread_id: String,
        message_id: String,
        slug: String,
    },

    /// A human-readable reasoning step
    Plan {
        cot: String,
    },

    WebResults {
        answer: Option<String>,
        results: Value,
        images: Vec<String>,
    },

    /// Structured tool output rendered by the client (weather cards, places)
    Widget {
        kind: String,
        data: Value,
    },

    RelatedQueries {
        queries: Vec<String>,
    },

    MarkdownAnswer {
        content: String,
        tool: String,
    },

    /// Failure discovered after the stream was opened
    Error {
        message: String,
        code: String,
    },

    End,
}

impl StreamEvent {
    pub fn plan(cot: impl Into<String>) -> Self {
        Self::Plan { cot: cot.into() }
    }

    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code: code.into(),
        }
    }

    /// Persisted event type, `None` for events that are never stored
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Self::Start { .. } => Some(EventType::Start),
            Self::Plan { .. } => Some(EventType::Plan),
            Self::WebResults { .. } => Some(EventType::WebResults),
            Self::Widget { .. } => Some(EventType::Widget),
            Self::RelatedQueries { .. } => Some(EventType::RelatedQueries),
            Self::MarkdownAnswer { .. } => Some(EventType::MarkdownAnswer),
            Self::End => Some(EventType::End),
            Self::Error { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.event_type() {
            Some(event_type) => event_type.as_str(),
            None => ERROR_EVENT,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End)
    }

    /// JSON payload written on the `data:` line
    pub fn payload(&self) -> Value {
        match self {
            Self::Start { thread_id, message_id, slug } => json!({
                "streaming": true,
                "thread_id": thread_id,
                "message_id": message_id,
                "slug": slug,
            }),
            Self::Plan { cot } => json!({
                "version": crate::models::RECORD_VERSION,
                "cot": cot,
                "streaming": true,
            }),
            Self::WebResults { answer, results, images } => json!({
                "answer": answer,
                "results": results,
                "images": images,
            }),
            Self::Widget { kind, data } => json!({
                "type": kind,
                "data": data,
            }),
            Self::RelatedQueries { queries } => json!({ "queries": queries }),
            Self::MarkdownAnswer { content, tool } => json!({
                "content": content,
                "tool": tool,
            }),
            Self::Error { message, code } => json!({
                "error": { "message": message, "code": code }
            }),
            Self::End => json!({ "streaming": false }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_payload_marks_streaming_false() {
        let end = StreamEvent::End;
        assert_eq!(end.name(), "END");
        assert_eq!(end.payload(), json!({ "streaming": false }));
        assert!(end.is_terminal());
    }

    #[test]
    fn test_error_event_is_not_persisted() {
        let err = StreamEvent::error("boom", "TOOL_FAILED");
        assert_eq!(err.name(), ERROR_EVENT);
        assert_eq!(err.event_type(), None);
        assert_eq!(err.payload()["error"]["code"], "TOOL_FAILED");
    }

    #[test]
    fn test_plan_payload_shape() {
        let plan = StreamEvent::plan("Deciding which tool fits best.");
        let payload = plan.payload();
        assert_eq!(plan.name(), "PLAN");
        assert_eq!(payload["cot"], "Deciding which tool fits best.");
        assert_eq!(payload["streaming"], true);
    }
}
