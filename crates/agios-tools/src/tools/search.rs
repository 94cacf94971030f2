use std::sync::Arc;

use agios_llm::GenerationClient;
use agios_types::StreamEvent;
use async_trait::async_trait;
use serde_json::json;

use crate::adapters::TavilyClient;
use crate::cot;
use crate::error::{Result, ToolError};
use crate::extract::{extract_search_terms, extract_summary};
use crate::kind::ToolKind;
use crate::tool::{EventSink, Tool, ToolOutput, ToolRequest};

/// Web search followed by a structured summary of the results.
///
/// This is the fallback for every other tool, so a failure here is final.
pub struct GeneralSearchTool {
    search: TavilyClient,
    generation: Arc<dyn GenerationClient>,
}

impl GeneralSearchTool {
    pub fn new(search: TavilyClient, generation: Arc<dyn GenerationClient>) -> Self {
        Self { search, generation }
    }
}

#[async_trait]
impl Tool for GeneralSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GeneralSearch
    }

    async fn execute(&self, request: ToolRequest<'_>, events: &dyn EventSink) -> Result<ToolOutput> {
        let mut output = ToolOutput::default();

        events.emit(StreamEvent::plan(cot::EXTRACTING_SEARCH_TERM)).await?;
        // Falls back to the raw query
        let term = match extract_search_terms(self.generation.as_ref(), request.query).await {
            Ok(terms) => {
                output.usage += terms.usage;
                terms
                    .value
                    .primary()
                    .map_or_else(|| request.query.to_string(), str::to_string)
            }
            Err(e) => {
                tracing::warn!(error = %e, "search term extraction failed, using raw query");
                request.query.to_string()
            }
        };

        events.emit(StreamEvent::plan(cot::SEARCHING_WEB)).await?;
        let results = self.search.search(&term).await?;
        events
            .emit(StreamEvent::WebResults {
                answer: results.answer.clone(),
                results: json!(results.results),
                images: results.images.clone(),
            })
            .await?;

        events.emit(StreamEvent::plan(cot::SYNTHESIZING_RESULTS)).await?;
        let input = format!("User query: {}\n\n{}", request.query, results.digest());
        let summary = extract_summary(self.generation.as_ref(), &input, request.attachments).await?;
        output.usage += summary.usage;
        let summary = summary.value;

        if !summary.related_search_terms.is_empty() {
            events
                .emit(StreamEvent::RelatedQueries {
                    queries: summary.related_search_terms.clone(),
                })
                .await?;
        }

        let answer = summary.to_markdown();
        output.answer = if answer.is_empty() {
            results
                .answer
                .clone()
                .filter(|a| !a.trim().is_empty())
                .ok_or_else(|| ToolError::NoData("search produced no answer".to_string()))?
        } else {
            answer
        };
        output.result = json!({
            "search_term": term,
            "result_count": results.results.len(),
            "key_takeaways": summary.key_takeaways,
            "metrics": summary.metrics,
        });
        output.related_queries = summary.related_search_terms;
        Ok(output)
    }
}
