use std::sync::{Arc, Mutex};
use std::time::Duration;

use agios_llm::{Generation, GenerationClient, GenerationRequest, TokenUsage};
use agios_tools::adapters::{NearbySearch, PlacesClient};
use agios_tools::{
    cot, Coordinates, DefaultLocation, Geocoder, NearbyPlacesTool, PlacesConfig, Tool, ToolError,
    ToolRequest, Tuning,
};
use agios_types::StreamEvent;
use async_trait::async_trait;
use mockito::Matcher;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

fn hits(n: usize) -> String {
    let results: Vec<_> = (1..=n)
        .map(|i| {
            json!({
                "place_id": format!("p{i}"),
                "name": format!("Cafe {i}"),
                "vicinity": format!("{i} Main St"),
                "geometry": { "location": { "lat": 37.0, "lng": -122.0 } },
                "types": ["cafe", "food"]
            })
        })
        .collect();
    json!({ "status": "OK", "results": results }).to_string()
}

fn details(i: usize) -> String {
    json!({
        "status": "OK",
        "result": {
            "formatted_address": format!("{i} Main St, Springfield"),
            "rating": 4.0 + (i as f64) / 10.0,
            "photos": [{ "photo_reference": "r1" }, { "photo_reference": "r2" }]
        }
    })
    .to_string()
}

fn client_for(server: &mockito::ServerGuard) -> PlacesClient {
    let config = PlacesConfig {
        api_key: "maps-key".to_string(),
        base_url: server.url(),
        ..PlacesConfig::default()
    };
    PlacesClient::new(reqwest::Client::new(), config)
}

fn search(max_results: usize) -> NearbySearch {
    NearbySearch {
        location: Coordinates::new(37.7749, -122.4194),
        radius_m: 1500,
        place_type: Some("cafe".to_string()),
        keyword: None,
        max_results,
    }
}

async fn mock_details(server: &mut mockito::ServerGuard, i: usize, status: usize) -> mockito::Mock {
    let mock = server
        .mock("GET", "/details/json")
        .match_query(Matcher::UrlEncoded("place_id".into(), format!("p{i}")))
        .with_status(status);
    let mock = if status == 200 {
        mock.with_body(details(i))
    } else {
        mock.with_body("boom")
    };
    mock.create_async().await
}

#[tokio::test]
async fn test_max_results_caps_detail_fetches() {
    let mut server = mockito::Server::new_async().await;
    let nearby = server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("location".into(), "37.774900,-122.419400".into()),
            Matcher::UrlEncoded("radius".into(), "1500".into()),
            Matcher::UrlEncoded("type".into(), "cafe".into()),
            Matcher::UrlEncoded("key".into(), "maps-key".into()),
        ]))
        .with_body(hits(5))
        .create_async()
        .await;
    let mut detail_mocks = Vec::new();
    for i in 1..=3 {
        detail_mocks.push(mock_details(&mut server, i, 200).await);
    }
    let unused = server
        .mock("GET", "/details/json")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let places = client_for(&server).nearby(&search(3)).await.unwrap();

    nearby.assert_async().await;
    for mock in detail_mocks {
        mock.assert_async().await;
    }
    unused.assert_async().await;

    let ids: Vec<_> = places.iter().map(|p| p.place_id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
    assert_eq!(places[0].simple_address, "1 Main St");
    assert_eq!(places[0].formatted_address.as_deref(), Some("1 Main St, Springfield"));
    assert_eq!(places[1].photo_urls.len(), 2);
    assert!(places[1].photo_urls[0].contains("photoreference=r1"));
}

#[tokio::test]
async fn test_failed_detail_fetch_skips_only_that_place() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::Any)
        .with_body(hits(5))
        .create_async()
        .await;
    mock_details(&mut server, 1, 200).await;
    mock_details(&mut server, 2, 500).await;
    mock_details(&mut server, 3, 200).await;

    let places = client_for(&server).nearby(&search(3)).await.unwrap();

    let ids: Vec<_> = places.iter().map(|p| p.place_id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p3"]);
}

#[tokio::test]
async fn test_zero_results_is_empty_and_denied_is_error() {
    let mut server = mockito::Server::new_async().await;
    let zero = server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::UrlEncoded("radius".into(), "1500".into()))
        .with_body(r#"{"status": "ZERO_RESULTS", "results": []}"#)
        .create_async()
        .await;

    let places = client_for(&server).nearby(&search(3)).await.unwrap();
    assert!(places.is_empty());
    zero.remove_async().await;

    server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::Any)
        .with_body(r#"{"status": "REQUEST_DENIED", "error_message": "bad key"}"#)
        .create_async()
        .await;

    let err = client_for(&server).nearby(&search(3)).await.unwrap_err();
    assert!(matches!(err, ToolError::Provider { message, .. } if message == "REQUEST_DENIED: bad key"));
}

#[tokio::test]
async fn test_missing_key() {
    let client = PlacesClient::new(reqwest::Client::new(), PlacesConfig::default());
    let err = client.nearby(&search(3)).await.unwrap_err();
    assert!(matches!(err, ToolError::MissingCredential("GOOGLE_MAP_KEY")));
}

/// Answers every summary request with the same text and keeps the prompts
struct Summarizer {
    answer: &'static str,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl GenerationClient for Summarizer {
    async fn generate(&self, request: GenerationRequest) -> agios_llm::error::Result<Generation> {
        self.prompts.lock().unwrap().push(request.prompt);
        Ok(Generation {
            text: self.answer.to_string(),
            usage: TokenUsage::new(20, 8),
            model: "scripted".to_string(),
        })
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

fn places_tool(server: &mockito::ServerGuard, llm: Arc<Summarizer>) -> NearbyPlacesTool {
    let config = PlacesConfig {
        api_key: "maps-key".to_string(),
        base_url: server.url(),
        max_results: 2,
        ..PlacesConfig::default()
    };
    NearbyPlacesTool::new(
        PlacesClient::new(reqwest::Client::new(), config.clone()),
        Geocoder::new(reqwest::Client::new(), format!("{}/geocode", server.url()), Duration::from_secs(5)),
        llm,
        config,
        DefaultLocation {
            city: "Lisbon".to_string(),
            latitude: 38.7223,
            longitude: -9.1393,
        },
        Tuning::default(),
    )
}

async fn run_places_tool(
    server: &mut mockito::ServerGuard,
    params: Value,
) -> (agios_tools::Result<agios_tools::ToolOutput>, Vec<StreamEvent>, Arc<Summarizer>) {
    let geocode = server
        .mock("GET", "/geocode")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let nearby = server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::UrlEncoded("location".into(), "38.722300,-9.139300".into()))
        .with_body(hits(4))
        .create_async()
        .await;
    mock_details(server, 1, 200).await;
    mock_details(server, 2, 200).await;

    let llm = Arc::new(Summarizer {
        answer: "Two cafes are close by.",
        prompts: Mutex::new(Vec::new()),
    });
    let tool = places_tool(server, llm.clone());
    let params: Map<String, Value> = serde_json::from_value(params).unwrap();
    let (tx, mut rx) = mpsc::channel(16);

    let output = tool
        .execute(
            ToolRequest {
                query: "coffee near me",
                params: &params,
                attachments: &[],
            },
            &tx,
        )
        .await;
    drop(tx);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    nearby.assert_async().await;
    geocode.assert_async().await;
    (output, events, llm)
}

#[tokio::test]
async fn test_places_tool_relative_location_uses_default_and_widget_precedes_summary() {
    let mut server = mockito::Server::new_async().await;
    let (output, events, llm) =
        run_places_tool(&mut server, json!({ "location": "near me", "business_type": "cafe" })).await;
    let output = output.unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(events[0], StreamEvent::plan(cot::EXTRACTING_NEARBY_PLACES));
    match &events[1] {
        StreamEvent::Widget { kind, data } => {
            assert_eq!(kind, "places");
            assert_eq!(data["location"], "Lisbon");
            assert_eq!(data["places"].as_array().unwrap().len(), 2);
        }
        other => panic!("expected widget, got {other:?}"),
    }
    assert_eq!(events[2], StreamEvent::plan(cot::SYNTHESIZING_RESULTS));

    assert_eq!(output.answer, "Two cafes are close by.");
    assert_eq!(output.usage, TokenUsage::new(20, 8));
    assert_eq!(output.result["location"], "Lisbon");
    assert_eq!(output.result["place_ids"], json!(["p1", "p2"]));

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Cafe 1"));
}

#[tokio::test]
async fn test_places_tool_missing_location_uses_default() {
    let mut server = mockito::Server::new_async().await;
    let (output, events, _) = run_places_tool(&mut server, json!({})).await;

    assert_eq!(output.unwrap().result["location"], "Lisbon");
    assert_eq!(events.iter().filter(|e| e.name() == "WIDGET").count(), 1);
}
