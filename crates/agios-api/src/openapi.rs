use utoipa::OpenApi;

use crate::{
    error::{ErrorBody, ErrorDetail},
    routes::{files, health, messages, threads},
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Agios API", description = "Threads answered by tool-backed, streamed responses"),
    paths(
        health::health_check,
        threads::create_thread,
        threads::get_thread,
        threads::delete_thread,
        messages::delete_message,
        files::upload_files,
    ),
    components(schemas(
        threads::CreateThreadRequest,
        files::UploadForm,
        health::HealthResponse,
        ErrorBody,
        ErrorDetail,
    )),
    tags(
        (name = "threads", description = "Create, read and delete threads"),
        (name = "messages", description = "Message management"),
        (name = "files", description = "File uploads"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_documents_multipart_body() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let body = &doc["paths"]["/api/v1/files/upload"]["post"]["requestBody"]["content"];

        assert!(body["multipart/form-data"].is_object());
        assert!(doc["components"]["schemas"]["UploadForm"].is_object());
        assert!(doc["paths"]["/api/v1/threads"]["post"].is_object());
    }
}
