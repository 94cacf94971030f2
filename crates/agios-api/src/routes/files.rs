use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use utoipa::ToSchema;

use agios_types::{UploadedFile, MAX_FILES_PER_MESSAGE, MAX_FILE_SIZE_BYTES, RECORD_VERSION};

use crate::{
    error::{ApiError, ApiResult, ErrorBody},
    state::AppState,
    upload::{is_supported, sanitize_file_name, sniff_mime, storage_name},
};

/// Multipart field carrying the files
pub const FILES_FIELD: &str = "files";

/// Multipart form accepted by the upload endpoint
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// One to five files, 10 MiB each at most
    #[schema(value_type = Vec<String>)]
    pub files: Vec<Vec<u8>>,
}

/// A file that passed validation and is waiting to be written
struct PendingUpload {
    original_file_name: String,
    mime_type: &'static str,
    bytes: Vec<u8>,
}

/// Upload up to five files
///
/// Every file is checked before any is stored, and a batch that fails while
/// storing is removed again, so a rejected request leaves nothing behind.
#[utoipa::path(
    post,
    path = "/api/v1/files/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "One to five parts named `files`, 10 MiB each at most"),
    responses(
        (status = 200, description = "Metadata of every stored file"),
        (status = 400, description = "FILE_TOO_LARGE, UNSUPPORTED_FILE_TYPE, MAX_FILE_COUNT_EXCEEDED, NO_FILES or UPLOAD_ERROR", body = ErrorBody)
    ),
    tag = "files"
)]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Vec<UploadedFile>>> {
    let mut pending = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        if pending.len() == MAX_FILES_PER_MESSAGE {
            return Err(ApiError::bad_request(
                format!("Maximum {MAX_FILES_PER_MESSAGE} files allowed per upload."),
                "MAX_FILE_COUNT_EXCEEDED",
            ));
        }
        pending.push(read_file(field).await?);
    }

    if pending.is_empty() {
        return Err(ApiError::bad_request("No files uploaded.", "NO_FILES"));
    }

    let root = state.files.root().to_path_buf();
    state.files.create_directory(&root).await.map_err(|e| {
        tracing::error!(dir = %root.display(), error = %e, "cannot create upload directory");
        ApiError::bad_request("Failed to store file.", "UPLOAD_ERROR")
    })?;

    let mut stored = Vec::with_capacity(pending.len());
    for upload in pending {
        match write(&state, upload).await {
            Ok(file) => stored.push(file),
            Err(e) => {
                discard(&state, &stored).await;
                return Err(e);
            }
        }
    }

    let saved = state.persistence.save_files_metadata(stored.clone()).await;
    if let Err(e) = saved {
        discard(&state, &stored).await;
        return Err(e.into());
    }

    for file in &stored {
        tracing::info!(file_id = %file.id, mime = %file.mime_type, size = file.file_size_bytes, "file uploaded");
    }
    Ok(Json(stored))
}

/// Read one part fully, enforcing the size limit while streaming
async fn read_file(mut field: Field<'_>) -> ApiResult<PendingUpload> {
    let original_file_name = sanitize_file_name(field.file_name().unwrap_or_default());
    let mut bytes = Vec::new();

    while let Some(chunk) = field.chunk().await.map_err(upload_error)? {
        if (bytes.len() + chunk.len()) as u64 > MAX_FILE_SIZE_BYTES {
            return Err(ApiError::bad_request(
                format!("{original_file_name} exceeds the 10 MiB limit."),
                "FILE_TOO_LARGE",
            ));
        }
        bytes.extend_from_slice(&chunk);
    }

    let mime_type = sniff_mime(&bytes);
    if !is_supported(mime_type) {
        return Err(ApiError::bad_request(
            format!("{original_file_name} has unsupported type {mime_type}."),
            "UNSUPPORTED_FILE_TYPE",
        ));
    }

    Ok(PendingUpload {
        original_file_name,
        mime_type,
        bytes,
    })
}

/// Write one validated upload to storage and build its record
async fn write(state: &AppState, upload: PendingUpload) -> ApiResult<UploadedFile> {
    let id = uuid::Uuid::new_v4().to_string();
    let file_name = storage_name(&id, &upload.original_file_name);
    let path = state.files.path_for(&file_name);

    state.files.save_file(&path, &upload.bytes).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to write upload");
        ApiError::bad_request("Failed to store file.", "UPLOAD_ERROR")
    })?;

    Ok(UploadedFile {
        id,
        file_name,
        original_file_name: upload.original_file_name,
        file_size_bytes: upload.bytes.len() as u64,
        mime_type: upload.mime_type.to_string(),
        uploaded_at: Utc::now(),
        version: RECORD_VERSION.to_string(),
    })
}

/// Remove the files of a batch that failed part-way; cleanup errors are logged only
async fn discard(state: &AppState, written: &[UploadedFile]) {
    for file in written {
        let path = state.files.path_for(&file.file_name);
        if let Err(e) = state.files.remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial upload");
        }
    }
}

fn upload_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::bad_request(e.body_text(), "UPLOAD_ERROR")
}
