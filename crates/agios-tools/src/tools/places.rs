use std::sync::Arc;

use agios_llm::{generate_text, GenerationClient, GenerationRequest};
use agios_types::StreamEvent;
use async_trait::async_trait;
use serde_json::json;

use crate::adapters::{Coordinates, Geocoder, NearbySearch, PlacesClient};
use crate::classifier::param;
use crate::config::{DefaultLocation, PlacesConfig, Tuning};
use crate::cot;
use crate::error::Result;
use crate::kind::ToolKind;
use crate::prompts;
use crate::tool::{EventSink, Tool, ToolOutput, ToolRequest};
use crate::tools::is_relative_location;

pub const WIDGET_KIND: &str = "places";

pub struct NearbyPlacesTool {
    client: PlacesClient,
    geocoder: Geocoder,
    generation: Arc<dyn GenerationClient>,
    config: PlacesConfig,
    default_location: DefaultLocation,
    tuning: Tuning,
}

impl NearbyPlacesTool {
    pub fn new(
        client: PlacesClient,
        geocoder: Geocoder,
        generation: Arc<dyn GenerationClient>,
        config: PlacesConfig,
        default_location: DefaultLocation,
        tuning: Tuning,
    ) -> Self {
        Self {
            client,
            geocoder,
            generation,
            config,
            default_location,
            tuning,
        }
    }

    async fn resolve(&self, location: Option<&str>) -> Result<(String, Coordinates)> {
        match location.filter(|l| !is_relative_location(l)) {
            Some(area) => Ok((area.to_string(), self.geocoder.lookup(area).await?)),
            None => Ok((
                self.default_location.city.clone(),
                Coordinates::new(self.default_location.latitude, self.default_location.longitude),
            )),
        }
    }
}

#[async_trait]
impl Tool for NearbyPlacesTool {
    fn kind(&self) -> ToolKind {
        ToolKind::NearbyBusinesses
    }

    async fn execute(&self, request: ToolRequest<'_>, events: &dyn EventSink) -> Result<ToolOutput> {
        events.emit(StreamEvent::plan(cot::EXTRACTING_NEARBY_PLACES)).await?;

        let (label, location) = self.resolve(param(request.params, "location")).await?;
        let search = NearbySearch {
            location,
            radius_m: self.config.radius_m,
            place_type: param(request.params, "business_type").map(str::to_string),
            keyword: param(request.params, "keyword").map(str::to_string),
            max_results: self.config.max_results,
        };
        let places = self.client.nearby(&search).await?;
        tracing::debug!(location = %label, found = places.len(), "nearby search complete");

        let data = json!({ "location": label, "places": places });
        events
            .emit(StreamEvent::Widget {
                kind: WIDGET_KIND.to_string(),
                data: data.clone(),
            })
            .await?;

        events.emit(StreamEvent::plan(cot::SYNTHESIZING_RESULTS)).await?;
        let prompt = prompts::business_summary(&self.tuning, &data.to_string());
        let summary = generate_text(self.generation.as_ref(), GenerationRequest::new(prompt)).await?;

        Ok(ToolOutput {
            answer: summary.value,
            usage: summary.usage,
            result: json!({
                "location": label,
                "place_ids": places.iter().map(|p| p.place_id.as_str()).collect::<Vec<_>>(),
            }),
            related_queries: Vec::new(),
        })
    }
}
