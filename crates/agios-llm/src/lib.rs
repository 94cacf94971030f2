pub mod config;
pub mod error;
pub mod gemini;
pub mod json;
pub mod retry;
pub mod traits;

pub use config::{GeminiConfig, DEFAULT_MODEL};
pub use error::{GenerationError, RetryError};
pub use gemini::GeminiClient;
pub use json::extract_json_segment;
pub use retry::{
    generate_structured, generate_text, parse_embedded_json, retry_parse, Structured, MAX_ATTEMPTS,
};
pub use traits::{Attachment, Generation, GenerationClient, GenerationRequest, TokenUsage};
