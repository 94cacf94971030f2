mod client;

pub use client::{mime_from_extension, GeminiClient};
