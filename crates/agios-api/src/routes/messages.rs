use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::{
    error::{ApiResult, ErrorBody},
    routes::parse_id,
    state::AppState,
};

/// Delete a message by ID
#[utoipa::path(
    delete,
    path = "/api/v1/messages/{message_id}",
    params(("message_id" = String, Path, description = "Message ID")),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 400, description = "Invalid message ID format", body = ErrorBody),
        (status = 404, description = "Message not found", body = ErrorBody)
    ),
    tag = "messages"
)]
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> ApiResult<StatusCode> {
    let message_id = parse_id(&message_id, "message", "INVALID_MESSAGE_ID")?;
    state.persistence.delete_message(&message_id).await?;

    tracing::info!(message_id = %message_id, "message deleted");
    Ok(StatusCode::NO_CONTENT)
}
