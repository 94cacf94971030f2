use std::sync::Arc;

use agios_llm::{generate_text, Attachment, GenerationClient, GenerationRequest};
use agios_types::StreamEvent;
use async_trait::async_trait;
use serde_json::json;

use crate::adapters::{find_video_url, validate_video_url};
use crate::classifier::param;
use crate::config::Tuning;
use crate::cot;
use crate::error::{Result, ToolError};
use crate::kind::ToolKind;
use crate::prompts;
use crate::tool::{EventSink, Tool, ToolOutput, ToolRequest};

const VIDEO_MIME: &str = "video/*";

pub struct YoutubeSummaryTool {
    generation: Arc<dyn GenerationClient>,
    tuning: Tuning,
}

impl YoutubeSummaryTool {
    pub fn new(generation: Arc<dyn GenerationClient>, tuning: Tuning) -> Self {
        Self { generation, tuning }
    }
}

#[async_trait]
impl Tool for YoutubeSummaryTool {
    fn kind(&self) -> ToolKind {
        ToolKind::YoutubeSummary
    }

    async fn execute(&self, request: ToolRequest<'_>, events: &dyn EventSink) -> Result<ToolOutput> {
        events.emit(StreamEvent::plan(cot::EXTRACTING_YT_TRANSCRIPT)).await?;

        let raw = param(request.params, "video_url")
            .or_else(|| find_video_url(request.query))
            .ok_or(ToolError::MissingParameter("video_url"))?;
        let url = validate_video_url(raw)?;

        events.emit(StreamEvent::plan(cot::SYNTHESIZING_RESULTS)).await?;
        let generation_request = GenerationRequest::new(prompts::youtube_summary(&self.tuning, url.as_str()))
            .attach(Attachment::uri(url.as_str(), VIDEO_MIME));
        let summary = generate_text(self.generation.as_ref(), generation_request).await?;

        Ok(ToolOutput {
            answer: summary.value,
            usage: summary.usage,
            result: json!({ "video_url": url.as_str() }),
            related_queries: Vec::new(),
        })
    }
}
