use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use agios_graph::RunInput;
use agios_llm::Attachment;
use agios_types::{
    text::{validate_slug_format, word_count},
    Message, Thread, ThreadWithMessages, MAX_FILES_PER_MESSAGE,
};

use crate::{
    error::{ApiError, ApiResult, ErrorBody},
    routes::parse_id,
    sse::{self, SseResponse},
    state::AppState,
};

/// Longest accepted query, in words
pub const MAX_QUERY_WORDS: usize = 1000;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateThreadRequest {
    /// Client-chosen slug, must start with the slugified first five query words
    pub slug: String,
    pub query_text: String,
    /// IDs returned by the upload endpoint
    #[serde(default)]
    pub file_ids: Vec<String>,
}

impl CreateThreadRequest {
    /// Checks that run before anything is persisted, in reporting order
    pub fn validate(&self) -> ApiResult<()> {
        if self.slug.trim().is_empty() {
            return Err(ApiError::bad_request("slug cannot be blank", "SLUG_BLANK"));
        }
        if self.query_text.trim().is_empty() {
            return Err(ApiError::bad_request("query_text cannot be blank", "QUERY_TEXT_BLANK"));
        }
        if self.file_ids.len() > MAX_FILES_PER_MESSAGE {
            return Err(ApiError::bad_request(
                format!("Maximum {MAX_FILES_PER_MESSAGE} file_ids allowed"),
                "MAX_FILE_COUNT_EXCEEDED",
            ));
        }
        if word_count(&self.query_text) > MAX_QUERY_WORDS {
            return Err(ApiError::bad_request(
                format!("Query text exceeds the {MAX_QUERY_WORDS}-word limit."),
                "QUERY_TEXT_TOO_LONG",
            ));
        }
        if !validate_slug_format(&self.slug, &self.query_text) {
            return Err(ApiError::bad_request("Invalid slug format", "INVALID_SLUG_FORMAT"));
        }
        Ok(())
    }
}

/// Create a thread and stream the answer to its first query
#[utoipa::path(
    post,
    path = "/api/v1/threads",
    request_body = CreateThreadRequest,
    responses(
        (status = 200, description = "Event stream: START, PLAN, WIDGET, WEB_RESULTS, RELATED_QUERIES, MARKDOWN_ANSWER, ERROR, END", content_type = "text/event-stream"),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Unknown file ID", body = ErrorBody),
        (status = 409, description = "Slug already taken", body = ErrorBody)
    ),
    tag = "threads"
)]
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateThreadRequest>, JsonRejection>,
) -> ApiResult<SseResponse> {
    let Json(req) = payload
        .map_err(|rejection| ApiError::bad_request(rejection.body_text(), "INVALID_REQUEST"))?;
    req.validate()?;

    if state.persistence.get_thread_by_slug(&req.slug).await?.is_some() {
        return Err(ApiError::conflict("Thread already exists", "SLUG_ALREADY_EXISTS"));
    }

    let thread = Thread::new(&req.slug);
    let message = Message::initial(&thread.id, &req.query_text, &state.model);
    let (thread, message) = state
        .persistence
        .create_thread_with_message(thread, message, &req.file_ids)
        .await?;

    tracing::info!(
        thread_id = %thread.id,
        message_id = %message.id,
        slug = %thread.slug,
        files = message.files.len(),
        "thread created"
    );

    let attachments = message
        .files
        .iter()
        .map(|f| Attachment::file(state.files.path_for(&f.file.file_name)))
        .collect();

    let cancel = CancellationToken::new();
    let events = state.pipeline.spawn_run(
        RunInput {
            thread,
            message,
            query: req.query_text,
            attachments,
        },
        cancel.clone(),
    );

    let (emitter, response) = sse::channel(state.pipeline.config().channel_capacity, cancel);
    tokio::spawn(emitter.forward(events));

    Ok(response)
}

/// Get a thread and its messages
#[utoipa::path(
    get,
    path = "/api/v1/threads/{thread_id}",
    params(("thread_id" = String, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread with messages ordered by index"),
        (status = 400, description = "Invalid thread ID format", body = ErrorBody),
        (status = 404, description = "Thread not found", body = ErrorBody)
    ),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadWithMessages>> {
    let thread_id = parse_id(&thread_id, "thread", "INVALID_THREAD_ID")?;
    let thread = state.persistence.get_thread_with_messages(&thread_id).await?;

    Ok(Json(thread))
}

/// Delete a thread with its messages and file associations
#[utoipa::path(
    delete,
    path = "/api/v1/threads/{thread_id}",
    params(("thread_id" = String, Path, description = "Thread ID")),
    responses(
        (status = 204, description = "Thread deleted"),
        (status = 400, description = "Invalid thread ID format", body = ErrorBody),
        (status = 404, description = "Thread not found", body = ErrorBody)
    ),
    tag = "threads"
)]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    let thread_id = parse_id(&thread_id, "thread", "INVALID_THREAD_ID")?;
    state.persistence.delete_thread(&thread_id).await?;

    tracing::info!(thread_id = %thread_id, "thread deleted");
    Ok(StatusCode::NO_CONTENT)
}
