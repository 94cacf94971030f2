use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Events buffered between the pipeline and the HTTP response
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Upper bound for one request from START to END
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_secs: u64,
}

fn default_channel_capacity() -> usize {
    64
}

fn default_execution_timeout() -> u64 {
    300
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            execution_timeout_secs: default_execution_timeout(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_execution_timeout(mut self, secs: u64) -> Self {
        self.execution_timeout_secs = secs;
        self
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }
}
