use agios_llm::RetryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0} not set")]
    MissingCredential(&'static str),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} error: {message}")]
    Provider {
        service: &'static str,
        message: String,
    },

    #[error("Geocoding failed: no results found for {0}")]
    LocationNotFound(String),

    #[error("{0}")]
    NoData(String),

    #[error(transparent)]
    Generation(#[from] RetryError),

    #[error("Event stream closed")]
    StreamClosed,

    #[error("Tool not registered: {0}")]
    NotRegistered(String),
}

impl ToolError {
    pub(crate) fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Transport { service, source }
    }

    /// Stable machine-readable code used in ERROR events and metadata
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential(_) => "MISSING_CREDENTIAL",
            Self::MissingParameter(_) | Self::InvalidParameter { .. } => "INVALID_TOOL_PARAMS",
            Self::Transport { .. } | Self::Status { .. } | Self::Provider { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::LocationNotFound(_) => "GEOCODING_FAILED",
            Self::NoData(_) => "NO_DATA",
            Self::Generation(RetryError::Parse { .. }) => "PARSE_ERROR",
            Self::Generation(_) => "GENERATION_FAILED",
            Self::StreamClosed => "STREAM_CLOSED",
            Self::NotRegistered(_) => "TOOL_NOT_REGISTERED",
        }
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;
