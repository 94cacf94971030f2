use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY not set")]
    MissingCredential,

    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Generation provider error ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("No content generated")]
    NoCandidates,

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Outcome of a structured generation that exhausted its attempts
#[derive(Error, Debug)]
pub enum RetryError {
    #[error("failed to generate text after {attempts} attempts: {source}")]
    Generation {
        attempts: usize,
        #[source]
        source: GenerationError,
    },

    #[error("failed to parse model output into structured data after {attempts} attempts")]
    Parse { attempts: usize },
}

pub type Result<T> = std::result::Result<T, GenerationError>;
