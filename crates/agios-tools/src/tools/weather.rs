use std::sync::Arc;

use agios_llm::{generate_text, GenerationClient, GenerationRequest};
use agios_types::StreamEvent;
use async_trait::async_trait;
use serde_json::json;

use crate::adapters::{Coordinates, WeatherClient, WeatherLocation};
use crate::classifier::param;
use crate::config::{DefaultLocation, Tuning};
use crate::cot;
use crate::error::Result;
use crate::kind::ToolKind;
use crate::prompts;
use crate::tool::{EventSink, Tool, ToolOutput, ToolRequest};
use crate::tools::is_relative_location;

pub const WIDGET_KIND: &str = "weather";

pub struct WeatherTool {
    client: WeatherClient,
    generation: Arc<dyn GenerationClient>,
    default_location: DefaultLocation,
    tuning: Tuning,
}

impl WeatherTool {
    pub fn new(
        client: WeatherClient,
        generation: Arc<dyn GenerationClient>,
        default_location: DefaultLocation,
        tuning: Tuning,
    ) -> Self {
        Self {
            client,
            generation,
            default_location,
            tuning,
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WeatherForecast
    }

    async fn execute(&self, request: ToolRequest<'_>, events: &dyn EventSink) -> Result<ToolOutput> {
        events.emit(StreamEvent::plan(cot::EXTRACTING_WEATHER)).await?;

        let (label, location) = match param(request.params, "location").filter(|l| !is_relative_location(l)) {
            Some(city) => (city.to_string(), WeatherLocation::City(city.to_string())),
            None => (
                self.default_location.city.clone(),
                WeatherLocation::Coordinates(Coordinates::new(
                    self.default_location.latitude,
                    self.default_location.longitude,
                )),
            ),
        };
        tracing::debug!(location = %label, "fetching forecast");

        let days = self.client.forecast(&location).await?;
        let data = json!({ "location": label, "forecast": days });
        events
            .emit(StreamEvent::Widget {
                kind: WIDGET_KIND.to_string(),
                data: data.clone(),
            })
            .await?;

        events.emit(StreamEvent::plan(cot::SYNTHESIZING_RESULTS)).await?;
        let prompt = prompts::weather_summary(&self.tuning, &data.to_string());
        let summary = generate_text(self.generation.as_ref(), GenerationRequest::new(prompt)).await?;

        Ok(ToolOutput {
            answer: summary.value,
            usage: summary.usage,
            result: json!({ "location": label, "days": days.len() }),
            related_queries: Vec::new(),
        })
    }
}
