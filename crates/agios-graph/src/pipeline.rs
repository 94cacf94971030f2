use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use agios_llm::{Attachment, GenerationClient, TokenUsage};
use agios_persist::PersistenceClient;
use agios_tools::{classify, cot, Tool, ToolError, ToolKind, ToolOutput, ToolRegistry, ToolRequest};
use agios_types::{EventType, Message, MessageUpdate, StreamEvent, StreamStatus, Thread};
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::builder::PipelineBuilder;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// Everything one streamed request needs to run
#[derive(Debug, Clone)]
pub struct RunInput {
    pub thread: Thread,
    /// The IN_PROGRESS message this run finalizes
    pub message: Message,
    pub query: String,
    /// Files resolved from the request, handed to the synthesis step
    pub attachments: Vec<Attachment>,
}

/// Classify, run a tool with fallback, persist, and stream events.
///
/// Cheap to clone; every run gets its own task and channel.
#[derive(Clone)]
pub struct Pipeline {
    generation: Arc<dyn GenerationClient>,
    tools: Arc<ToolRegistry>,
    persistence: Arc<dyn PersistenceClient>,
    config: PipelineConfig,
}

impl Pipeline {
    pub(crate) fn new(
        generation: Arc<dyn GenerationClient>,
        tools: ToolRegistry,
        persistence: Arc<dyn PersistenceClient>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            generation,
            tools: Arc::new(tools),
            persistence,
            config,
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Spawn the run and hand back its event stream.
    ///
    /// The stream always ends with END unless the consumer goes away first.
    /// Dropping the receiver, or cancelling `cancel`, aborts in-flight work
    /// and leaves the message FAILED.
    pub fn spawn_run(&self, input: RunInput, cancel: CancellationToken) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);

        let run = Run {
            generation: Arc::clone(&self.generation),
            tools: Arc::clone(&self.tools),
            persistence: Arc::clone(&self.persistence),
            config: self.config.clone(),
            tx,
            cancel,
            started: Instant::now(),
            usage: TokenUsage::default(),
            metadata: Map::new(),
            input,
        };

        tokio::spawn(run.execute());

        rx
    }
}

/// State of a single in-flight request
struct Run {
    generation: Arc<dyn GenerationClient>,
    tools: Arc<ToolRegistry>,
    persistence: Arc<dyn PersistenceClient>,
    config: PipelineConfig,
    tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
    started: Instant,
    usage: TokenUsage,
    metadata: Map<String, Value>,
    input: RunInput,
}

impl Run {
    async fn execute(mut self) {
        let thread_id = self.input.thread.id.clone();
        let message_id = self.input.message.id.clone();
        let started = self.started;
        tracing::info!(thread_id = %thread_id, message_id = %message_id, "pipeline run started");

        let timeout = self.config.execution_timeout();
        let outcome = match tokio::time::timeout(timeout, self.drive()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(PipelineError::Timeout(self.config.execution_timeout_secs)),
        };

        match outcome {
            Ok((kind, output)) => self.finish(kind, output).await,
            Err(PipelineError::Cancelled) => self.abandon().await,
            Err(e) => self.fail(e).await,
        }

        tracing::info!(
            thread_id = %thread_id,
            message_id = %message_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline run finished"
        );
    }

    async fn drive(&mut self) -> Result<(ToolKind, ToolOutput)> {
        self.emit(StreamEvent::Start {
            thread_id: self.input.thread.id.clone(),
            message_id: self.input.message.id.clone(),
            slug: self.input.thread.slug.clone(),
        })
        .await?;
        self.emit(StreamEvent::plan(cot::STARTED)).await?;
        self.emit(StreamEvent::plan(cot::MAKING_TOOL_DECISION)).await?;

        let (kind, params) = self.select_tool().await?;
        self.run_tool(kind, params).await
    }

    /// Ask the model for a tool; any failure routes to general search
    async fn select_tool(&mut self) -> Result<(ToolKind, Map<String, Value>)> {
        let classified = self
            .guard(classify(self.generation.as_ref(), &self.input.query))
            .await?;

        match classified {
            Ok(selection) => {
                self.usage += selection.usage;
                let selection = selection.value;
                match selection.kind() {
                    Some(kind) => Ok((kind, selection.params)),
                    None => {
                        tracing::warn!(tool = %selection.tool, "classifier picked an unknown tool");
                        self.metadata.insert(
                            "classification_error".to_string(),
                            json!(format!("unknown tool '{}'", selection.tool)),
                        );
                        Ok((ToolKind::GeneralSearch, Map::new()))
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "classification failed, using general search");
                self.metadata
                    .insert("classification_error".to_string(), json!(e.to_string()));
                Ok((ToolKind::GeneralSearch, Map::new()))
            }
        }
    }

    async fn run_tool(&mut self, kind: ToolKind, params: Map<String, Value>) -> Result<(ToolKind, ToolOutput)> {
        self.record_tool(kind, &params);

        let attempt = match self.tools.get(kind) {
            Ok(tool) => self.invoke(tool, &params).await,
            Err(e) => Err(e.into()),
        };

        match attempt {
            Ok(output) => Ok((kind, output)),
            Err(PipelineError::Tool(e)) if kind.is_specialized() => {
                tracing::warn!(tool = %kind, error = %e, "tool failed, falling back to general search");
                self.metadata.insert(
                    "fallback_reason".to_string(),
                    json!({ "tool": kind.as_str(), "message": e.to_string(), "code": e.code() }),
                );
                self.emit(StreamEvent::plan(cot::falling_back(kind.as_str()))).await?;

                let fallback = ToolKind::GeneralSearch;
                let params = Map::new();
                self.record_tool(fallback, &params);
                let search = self.tools.get(fallback)?;
                let output = self.invoke(search, &params).await?;
                Ok((fallback, output))
            }
            Err(e) => Err(e),
        }
    }

    async fn invoke(&self, tool: Arc<dyn Tool>, params: &Map<String, Value>) -> Result<ToolOutput> {
        let request = ToolRequest {
            query: &self.input.query,
            params,
            attachments: &self.input.attachments,
        };

        match self.guard(tool.execute(request, &self.tx)).await? {
            Ok(output) => Ok(output),
            Err(ToolError::StreamClosed) => {
                self.cancel.cancel();
                Err(PipelineError::Cancelled)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn record_tool(&mut self, kind: ToolKind, params: &Map<String, Value>) {
        self.metadata.insert("tool".to_string(), json!(kind.as_str()));
        self.metadata
            .insert("params".to_string(), Value::Object(params.clone()));
    }

    /// Race `fut` against cancellation and the consumer hanging up
    async fn guard<F: Future>(&self, fut: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled),
            _ = self.tx.closed() => {
                self.cancel.cancel();
                Err(PipelineError::Cancelled)
            }
            out = fut => Ok(out),
        }
    }

    async fn emit(&self, event: StreamEvent) -> Result<()> {
        self.tx.send(event).await.map_err(|_| {
            self.cancel.cancel();
            PipelineError::Cancelled
        })
    }

    async fn finish(mut self, kind: ToolKind, output: ToolOutput) {
        self.usage += output.usage;
        if self.emit(StreamEvent::plan(cot::ENDED)).await.is_err() {
            return self.abandon().await;
        }

        self.metadata.insert("result".to_string(), output.result);
        self.metadata
            .insert("related_queries".to_string(), json!(output.related_queries));

        let update = MessageUpdate::new()
            .response_text(output.answer.clone())
            .event_type(EventType::End)
            .stream_status(StreamStatus::Done)
            .metadata(Value::Object(self.metadata.clone()))
            .tokens(self.usage.input_tokens, self.usage.output_tokens)
            .response_time(self.started.elapsed().as_secs_f64())
            .model(self.generation.model());

        let finalized = self
            .persistence
            .update_message(&self.input.message.id, update)
            .await;
        if let Err(e) = finalized {
            tracing::error!(message_id = %self.input.message.id, error = %e, "failed to finalize message");
            return self.fail(PipelineError::Persist(e)).await;
        }

        let _ = self
            .emit(StreamEvent::MarkdownAnswer {
                content: output.answer,
                tool: kind.as_str().to_string(),
            })
            .await;
        let _ = self.emit(StreamEvent::End).await;
    }

    /// Mark the message FAILED, then report in-band and close the stream
    async fn fail(mut self, error: PipelineError) {
        tracing::error!(message_id = %self.input.message.id, error = %error, code = error.code(), "pipeline run failed");

        self.mark_failed(&error).await;
        let _ = self.emit(StreamEvent::error(error.to_string(), error.code())).await;
        let _ = self.emit(StreamEvent::End).await;
    }

    /// Nobody is listening; only the stored message needs closing out
    async fn abandon(mut self) {
        tracing::info!(message_id = %self.input.message.id, "client disconnected, abandoning run");
        self.mark_failed(&PipelineError::Cancelled).await;
    }

    async fn mark_failed(&mut self, error: &PipelineError) {
        self.metadata.insert(
            "error".to_string(),
            json!({ "message": error.to_string(), "code": error.code() }),
        );

        let update = MessageUpdate::new()
            .event_type(EventType::End)
            .stream_status(StreamStatus::Failed)
            .metadata(Value::Object(self.metadata.clone()))
            .tokens(self.usage.input_tokens, self.usage.output_tokens)
            .response_time(self.started.elapsed().as_secs_f64())
            .model(self.generation.model());

        let marked = self
            .persistence
            .update_message(&self.input.message.id, update)
            .await;
        if let Err(e) = marked {
            tracing::warn!(message_id = %self.input.message.id, error = %e, "could not mark message failed");
        }
    }
}
