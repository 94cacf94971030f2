use agios_tools::{SearchConfig, TavilyClient, ToolError};
use mockito::Matcher;
use serde_json::json;

fn client_for(server: &mockito::ServerGuard, key: &str) -> TavilyClient {
    let config = SearchConfig {
        api_key: key.to_string(),
        base_url: server.url(),
        ..SearchConfig::default()
    };
    TavilyClient::new(reqwest::Client::new(), config)
}

#[tokio::test]
async fn test_search_sends_query_and_parses_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/search")
        .match_header("authorization", "Bearer tvly-key")
        .match_body(Matcher::PartialJson(json!({ "query": "rust async", "max_results": 10 })))
        .with_body(
            json!({
                "answer": "Async Rust uses futures.",
                "results": [
                    { "title": "Async book", "url": "https://rust-lang.github.io/async-book/", "content": "Futures...", "score": 0.92 }
                ],
                "images": ["https://example.com/a.png"]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let response = client_for(&server, "tvly-key").search("rust async").await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.answer.as_deref(), Some("Async Rust uses futures."));
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].score, 0.92);
    assert_eq!(response.images, vec!["https://example.com/a.png".to_string()]);
}

#[tokio::test]
async fn test_search_requires_key() {
    let server = mockito::Server::new_async().await;
    let err = client_for(&server, "").search("x").await.unwrap_err();
    assert!(matches!(err, ToolError::MissingCredential("TAVILY_API_KEY")));
}

#[tokio::test]
async fn test_search_status_error() {
    let mut server = mockito::Server::new_async().await;
    server.mock("POST", "/search").with_status(401).create_async().await;

    let err = client_for(&server, "bad").search("x").await.unwrap_err();
    assert!(matches!(err, ToolError::Status { status: 401, .. }));
}
