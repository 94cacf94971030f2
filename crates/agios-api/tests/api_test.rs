use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agios_api::{build_router, config::Config, state::AppState};
use agios_graph::Pipeline;
use agios_llm::{Generation, GenerationClient, GenerationError, GenerationRequest, TokenUsage};
use agios_persist::{
    FileStore, InMemoryPersistenceClient, LocalFileStore, PersistError, PersistenceClient,
};
use agios_tools::{ToolRegistry, ToolsConfig, WeatherConfig};
use agios_types::{StreamStatus, Thread};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use mockito::Matcher;
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "agios-test-boundary";

struct Scripted {
    replies: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
        })
    }
}

#[async_trait]
impl GenerationClient for Scripted {
    async fn generate(&self, _request: GenerationRequest) -> agios_llm::error::Result<Generation> {
        let text = self.replies.lock().unwrap().pop().ok_or(GenerationError::NoCandidates)?;
        Ok(Generation {
            text,
            usage: TokenUsage::new(7, 3),
            model: "scripted".to_string(),
        })
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Local storage whose writes start failing after `healthy_writes` files
struct FlakyFileStore {
    inner: LocalFileStore,
    healthy_writes: usize,
    writes: AtomicUsize,
}

#[async_trait]
impl FileStore for FlakyFileStore {
    async fn create_directory(&self, path: &Path) -> agios_persist::Result<()> {
        self.inner.create_directory(path).await
    }

    async fn save_file(&self, path: &Path, bytes: &[u8]) -> agios_persist::Result<()> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.healthy_writes {
            return Err(PersistError::Io(std::io::Error::other("disk full")));
        }
        self.inner.save_file(path, bytes).await
    }

    async fn remove_file(&self, path: &Path) -> agios_persist::Result<()> {
        self.inner.remove_file(path).await
    }

    fn root(&self) -> &Path {
        self.inner.root()
    }
}

struct Harness {
    app: Router,
    persistence: Arc<InMemoryPersistenceClient>,
    upload_dir: tempfile::TempDir,
}

fn harness(llm: Arc<Scripted>, tools: ToolsConfig) -> Harness {
    harness_with_store(llm, tools, |dir| Arc::new(LocalFileStore::new(dir)))
}

fn harness_with_store(
    llm: Arc<Scripted>,
    tools: ToolsConfig,
    store: impl FnOnce(PathBuf) -> Arc<dyn FileStore>,
) -> Harness {
    let config_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
    let config = Config::from_file(config_path).unwrap();

    let upload_dir = tempfile::tempdir().unwrap();
    let persistence = Arc::new(InMemoryPersistenceClient::new());
    let files = store(upload_dir.path().to_path_buf());

    let registry = ToolRegistry::standard(llm.clone(), reqwest::Client::new(), &tools);
    let pipeline = Pipeline::builder()
        .generation_client(llm)
        .tools(registry)
        .persistence(persistence.clone())
        .build()
        .unwrap();

    let state = AppState::new(config, persistence.clone(), files, pipeline, "scripted");
    Harness {
        app: build_router(Arc::new(state)),
        persistence,
        upload_dir,
    }
}

fn idle_harness() -> Harness {
    harness(Scripted::new(&[]), ToolsConfig::default())
}

fn create_thread_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/threads")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(parts: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, content) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/files/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn stored_files(dir: &tempfile::TempDir) -> usize {
    std::fs::read_dir(dir.path()).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_health() {
    let h = idle_harness();
    let response = h
        .app
        .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_existing_slug_conflicts_without_duplicate() {
    let h = idle_harness();
    let slug = "best-pizza-in-rome-x7f2";
    let original = h.persistence.create_thread(Thread::new(slug)).await.unwrap();

    let response = h
        .app
        .oneshot(create_thread_request(json!({
            "slug": slug,
            "query_text": "Best pizza in Rome",
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"]["code"], "SLUG_ALREADY_EXISTS");

    let thread = h.persistence.get_thread_by_slug(slug).await.unwrap().unwrap();
    assert_eq!(thread.id, original.id);
    assert!(h.persistence.get_thread_with_messages(&original.id).await.unwrap().messages.is_empty());
}

#[tokio::test]
async fn test_validation_errors_use_json_envelope() {
    let h = idle_harness();

    let blank = h
        .app
        .clone()
        .oneshot(create_thread_request(json!({ "slug": "", "query_text": "hi" })))
        .await
        .unwrap();
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(blank).await["error"]["code"], "SLUG_BLANK");

    let malformed = h
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/threads")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(malformed).await["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_unknown_file_id_persists_nothing() {
    let h = idle_harness();
    let slug = "summarize-my-notes-abc";

    let response = h
        .app
        .oneshot(create_thread_request(json!({
            "slug": slug,
            "query_text": "Summarize my notes",
            "file_ids": [uuid::Uuid::new_v4().to_string()],
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"]["code"], "FILE_NOT_FOUND");
    assert!(h.persistence.get_thread_by_slug(slug).await.unwrap().is_none());
}

#[tokio::test]
async fn test_six_uploads_rejected_before_anything_is_stored() {
    let h = idle_harness();
    let parts: Vec<(&str, &[u8])> = (0..6).map(|_| ("a.txt", b"hello".as_slice())).collect();

    let response = h.app.oneshot(upload_request(&parts)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "MAX_FILE_COUNT_EXCEEDED");
    assert_eq!(stored_files(&h.upload_dir), 0);
}

#[tokio::test]
async fn test_zip_rejected_and_batch_left_unwritten() {
    let h = idle_harness();

    let response = h
        .app
        .oneshot(upload_request(&[
            ("notes.txt", b"plain text".as_slice()),
            ("archive.zip", b"PK\x03\x04\x14\x00\x00\x00\x08\x00".as_slice()),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "UNSUPPORTED_FILE_TYPE");
    assert_eq!(stored_files(&h.upload_dir), 0);
}

#[tokio::test]
async fn test_upload_stores_files_and_metadata() {
    let h = idle_harness();

    let response = h
        .app
        .oneshot(upload_request(&[
            ("../Report.PDF", b"%PDF-1.7\n%...".as_slice()),
            ("notes.txt", b"remember the milk".as_slice()),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let uploads = body.as_array().unwrap();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0]["original_file_name"], "Report.PDF");
    assert_eq!(uploads[0]["mime_type"], "application/pdf");
    assert!(uploads[0]["file_name"].as_str().unwrap().ends_with(".pdf"));
    assert_eq!(uploads[1]["mime_type"], "text/plain");
    assert_eq!(uploads[1]["file_size_bytes"], 17);
    assert_eq!(uploads[1]["version"], "1.0");
    assert_eq!(stored_files(&h.upload_dir), 2);

    let ids: Vec<String> = uploads.iter().map(|u| u["id"].as_str().unwrap().to_string()).collect();
    assert_eq!(h.persistence.get_files_by_ids(&ids).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_write_removes_files_already_stored() {
    let h = harness_with_store(Scripted::new(&[]), ToolsConfig::default(), |dir| {
        Arc::new(FlakyFileStore {
            inner: LocalFileStore::new(dir),
            healthy_writes: 1,
            writes: AtomicUsize::new(0),
        })
    });

    let response = h
        .app
        .oneshot(upload_request(&[
            ("first.txt", b"first file".as_slice()),
            ("second.txt", b"second file".as_slice()),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "UPLOAD_ERROR");
    assert_eq!(stored_files(&h.upload_dir), 0);
}

/// Split a `text/event-stream` body into (event, data) pairs
fn parse_sse(body: &str) -> Vec<(String, Value)> {
    body.split("\n\n")
        .filter(|frame| !frame.trim().is_empty())
        .map(|frame| {
            let mut name = String::new();
            let mut data = Value::Null;
            for line in frame.lines() {
                if let Some(rest) = line.strip_prefix("event: ") {
                    name = rest.to_string();
                } else if let Some(rest) = line.strip_prefix("data: ") {
                    data = serde_json::from_str(rest).unwrap();
                }
            }
            (name, data)
        })
        .collect()
}

#[tokio::test]
async fn test_weather_thread_streams_to_end_and_message_is_done() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/geocode")
        .match_query(Matcher::UrlEncoded("name".into(), "Berlin".into()))
        .with_body(r#"{"results": [{"name": "Berlin", "latitude": 52.52, "longitude": 13.41}]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/forecast")
        .match_query(Matcher::Any)
        .with_body(
            json!({
                "current_weather": { "time": "2024-06-01T12:00", "temperature": 21.0 },
                "daily": { "time": ["2024-06-01"], "temperature_2m_max": [23.0], "temperature_2m_min": [12.0] },
                "hourly": { "time": [] }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let tools = ToolsConfig {
        weather: WeatherConfig {
            geocode_url: format!("{}/geocode", server.url()),
            forecast_url: format!("{}/forecast", server.url()),
            ..WeatherConfig::default()
        },
        ..ToolsConfig::default()
    };
    let llm = Scripted::new(&[
        r#"{"tool": "weather_forecast", "params": {"location": "Berlin"}}"#,
        "Currently 21°C in Berlin with a high of 23°C.",
    ]);
    let h = harness(llm, tools);

    let response = h
        .app
        .clone()
        .oneshot(create_thread_request(json!({
            "slug": "weather-in-berlin-q1",
            "query_text": "Weather in Berlin",
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let events = parse_sse(std::str::from_utf8(&bytes).unwrap());
    let names: Vec<&str> = events.iter().map(|(name, _)| name.as_str()).collect();

    assert_eq!(
        names,
        vec!["START", "PLAN", "PLAN", "PLAN", "WIDGET", "PLAN", "PLAN", "MARKDOWN_ANSWER", "END"]
    );
    assert_eq!(events[0].1["slug"], "weather-in-berlin-q1");
    assert_eq!(events[4].1["type"], "weather");
    assert_eq!(events[7].1["tool"], "weather_forecast");
    assert_eq!(events[8].1, json!({ "streaming": false }));

    let thread_id = events[0].1["thread_id"].as_str().unwrap().to_string();
    let thread = h.persistence.get_thread_with_messages(&thread_id).await.unwrap();
    let message = &thread.messages[0];
    assert_eq!(message.stream_status, StreamStatus::Done);
    assert_eq!(
        message.response_text.as_deref(),
        Some("Currently 21°C in Berlin with a high of 23°C.")
    );
    assert_eq!((message.input_tokens, message.output_tokens), (14, 6));

    let fetched = h
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/threads/{thread_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(json_body(fetched).await["messages"][0]["stream_status"], "DONE");
}

#[tokio::test]
async fn test_delete_thread_then_get_is_not_found() {
    let h = idle_harness();
    let thread = h.persistence.create_thread(Thread::new("x-1")).await.unwrap();

    let deleted = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/threads/{}", thread.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/threads/{}", thread.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(missing).await["error"]["code"], "THREAD_NOT_FOUND");

    let bad_id = h
        .app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/messages/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(bad_id).await["error"]["code"], "INVALID_MESSAGE_ID");
}
