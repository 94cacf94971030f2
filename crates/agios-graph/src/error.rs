use agios_persist::PersistError;
use agios_tools::ToolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The client went away or the request was cancelled
    #[error("Client disconnected")]
    Cancelled,

    #[error("Pipeline exceeded {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Persistence failed: {0}")]
    Persist(#[from] PersistError),

    #[error("Invalid pipeline configuration: {0}")]
    Config(&'static str),
}

impl PipelineError {
    /// Code carried by the in-band ERROR event
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cancelled => "CLIENT_DISCONNECTED",
            Self::Timeout(_) => "PIPELINE_TIMEOUT",
            Self::Tool(e) => e.code(),
            Self::Persist(_) => "DATABASE_ERROR",
            Self::Config(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
