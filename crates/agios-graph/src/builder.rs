use std::sync::Arc;

use agios_llm::GenerationClient;
use agios_persist::PersistenceClient;
use agios_tools::ToolRegistry;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::pipeline::Pipeline;

/// Builder for constructing a Pipeline
#[derive(Default)]
pub struct PipelineBuilder {
    generation: Option<Arc<dyn GenerationClient>>,
    tools: Option<ToolRegistry>,
    persistence: Option<Arc<dyn PersistenceClient>>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model used for tool classification
    pub fn generation_client(mut self, client: Arc<dyn GenerationClient>) -> Self {
        self.generation = Some(client);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn persistence(mut self, client: Arc<dyn PersistenceClient>) -> Self {
        self.persistence = Some(client);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        let generation = self
            .generation
            .ok_or(PipelineError::Config("generation client is required"))?;
        let tools = self.tools.ok_or(PipelineError::Config("tool registry is required"))?;
        let persistence = self
            .persistence
            .ok_or(PipelineError::Config("persistence client is required"))?;
        if self.config.channel_capacity == 0 {
            return Err(PipelineError::Config("channel capacity must be positive"));
        }

        Ok(Pipeline::new(generation, tools, persistence, self.config))
    }
}
