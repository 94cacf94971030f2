use std::collections::HashMap;
use std::sync::Arc;

use agios_llm::{Attachment, GenerationClient, TokenUsage};
use agios_types::StreamEvent;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::adapters::{PlacesClient, TavilyClient, WeatherClient};
use crate::config::ToolsConfig;
use crate::error::{Result, ToolError};
use crate::kind::ToolKind;
use crate::tools::{GeneralSearchTool, NearbyPlacesTool, WeatherTool, YoutubeSummaryTool};

/// Destination for the intermediate events a tool produces
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Fails with `StreamClosed` once nobody is listening
    async fn emit(&self, event: StreamEvent) -> Result<()>;
}

#[async_trait]
impl EventSink for mpsc::Sender<StreamEvent> {
    async fn emit(&self, event: StreamEvent) -> Result<()> {
        self.send(event).await.map_err(|_| ToolError::StreamClosed)
    }
}

/// Everything a tool gets to see about the request
#[derive(Debug, Clone, Copy)]
pub struct ToolRequest<'a> {
    pub query: &'a str,
    pub params: &'a Map<String, Value>,
    /// Files attached to the message
    pub attachments: &'a [Attachment],
}

/// Final answer of a tool plus what it cost
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Markdown shown to the user
    pub answer: String,
    pub usage: TokenUsage,
    /// Compact record of the raw result, kept in message metadata
    pub result: Value,
    /// Follow-up search suggestions, if the tool produced any
    pub related_queries: Vec<String>,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    /// Fetch, emit intermediate events, and synthesize the answer
    async fn execute(&self, request: ToolRequest<'_>, events: &dyn EventSink) -> Result<ToolOutput>;
}

/// Tool lookup by kind
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four production tools wired to their external services
    pub fn standard(
        generation: Arc<dyn GenerationClient>,
        http: reqwest::Client,
        config: &ToolsConfig,
    ) -> Self {
        let weather = WeatherClient::new(http.clone(), config.weather.clone());
        let geocoder = weather.geocoder().clone();
        let places = PlacesClient::new(http.clone(), config.places.clone());
        let search = TavilyClient::new(http, config.search.clone());

        Self::new()
            .register(Arc::new(WeatherTool::new(
                weather,
                Arc::clone(&generation),
                config.default_location.clone(),
                config.tuning.clone(),
            )))
            .register(Arc::new(NearbyPlacesTool::new(
                places,
                geocoder,
                Arc::clone(&generation),
                config.places.clone(),
                config.default_location.clone(),
                config.tuning.clone(),
            )))
            .register(Arc::new(YoutubeSummaryTool::new(
                Arc::clone(&generation),
                config.tuning.clone(),
            )))
            .register(Arc::new(GeneralSearchTool::new(search, generation)))
    }

    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.kind(), tool);
        self
    }

    pub fn get(&self, kind: ToolKind) -> Result<Arc<dyn Tool>> {
        self.tools
            .get(&kind)
            .cloned()
            .ok_or_else(|| ToolError::NotRegistered(kind.to_string()))
    }
}
