use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use url::Url;

use crate::adapters::geocode::Coordinates;
use crate::config::PlacesConfig;
use crate::error::{Result, ToolError};

const SERVICE: &str = "places";
const DETAIL_FIELDS: &str = "name,formatted_address,international_phone_number,website,rating,opening_hours,photo,price_level,business_status,url,user_ratings_total";
const PHOTO_MAX_WIDTH: &str = "400";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Search hit merged with its detail record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: String,
    pub simple_address: String,
    pub location: Option<LatLng>,
    pub types: Vec<String>,
    pub formatted_address: Option<String>,
    pub international_phone_number: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub opening_hours: Option<serde_json::Value>,
    pub photo_urls: Vec<String>,
    pub price_level: Option<u8>,
    pub business_status: Option<String>,
    pub url: Option<String>,
    pub user_ratings_total: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct NearbySearch {
    pub location: Coordinates,
    pub radius_m: u32,
    pub place_type: Option<String>,
    pub keyword: Option<String>,
    pub max_results: usize,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<NearbyHit>,
}

#[derive(Debug, Clone, Deserialize)]
struct NearbyHit {
    place_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    vicinity: String,
    geometry: Option<Geometry>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    result: Option<DetailRecord>,
}

#[derive(Debug, Deserialize)]
struct DetailRecord {
    formatted_address: Option<String>,
    international_phone_number: Option<String>,
    website: Option<String>,
    rating: Option<f64>,
    opening_hours: Option<serde_json::Value>,
    #[serde(default)]
    photos: Vec<Photo>,
    price_level: Option<u8>,
    business_status: Option<String>,
    url: Option<String>,
    user_ratings_total: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    photo_reference: String,
}

fn provider_error(status: String, message: Option<String>) -> ToolError {
    ToolError::Provider {
        service: SERVICE,
        message: message.map_or(status.clone(), |m| format!("{status}: {m}")),
    }
}

/// Nearby search plus concurrent detail lookups (Google Places)
#[derive(Debug, Clone)]
pub struct PlacesClient {
    http: reqwest::Client,
    config: Arc<PlacesConfig>,
}

impl PlacesClient {
    pub fn new(http: reqwest::Client, config: PlacesConfig) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    /// Search around `search.location` and enrich up to `max_results` hits.
    ///
    /// Details are fetched on one task per hit. A failed detail lookup drops
    /// that place only. The result keeps the search ranking.
    pub async fn nearby(&self, search: &NearbySearch) -> Result<Vec<PlaceDetails>> {
        if self.config.api_key.is_empty() {
            return Err(ToolError::MissingCredential("GOOGLE_MAP_KEY"));
        }

        let hits = self.search(search).await?;
        let combined: Arc<Mutex<Vec<(usize, PlaceDetails)>>> = Arc::new(Mutex::new(Vec::new()));
        let mut tasks = JoinSet::new();

        for (rank, hit) in hits.into_iter().take(search.max_results).enumerate() {
            let http = self.http.clone();
            let config = Arc::clone(&self.config);
            let combined = Arc::clone(&combined);

            tasks.spawn(async move {
                match fetch_details(&http, &config, &hit.place_id).await {
                    Ok(record) => {
                        let place = merge(&config, hit, record);
                        combined.lock().await.push((rank, place));
                    }
                    Err(e) => {
                        tracing::warn!(place_id = %hit.place_id, error = %e, "skipping place, details unavailable");
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "place detail task did not complete");
            }
        }

        let mut ranked = std::mem::take(&mut *combined.lock().await);
        ranked.sort_by_key(|(rank, _)| *rank);
        Ok(ranked.into_iter().map(|(_, place)| place).collect())
    }

    async fn search(&self, search: &NearbySearch) -> Result<Vec<NearbyHit>> {
        let location = format!("{:.6},{:.6}", search.location.latitude, search.location.longitude);
        let radius = search.radius_m.to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("location", location.as_str()),
            ("radius", radius.as_str()),
            ("key", self.config.api_key.as_str()),
        ];
        if let Some(place_type) = search.place_type.as_deref() {
            query.push(("type", place_type));
        }
        if let Some(keyword) = search.keyword.as_deref() {
            query.push(("keyword", keyword));
        }

        let response = self
            .http
            .get(format!("{}/nearbysearch/json", self.config.base_url))
            .query(&query)
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(ToolError::transport(SERVICE))?;

        if !response.status().is_success() {
            return Err(ToolError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let body: NearbyResponse = response.json().await.map_err(ToolError::transport(SERVICE))?;
        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(body.results),
            _ => Err(provider_error(body.status, body.error_message)),
        }
    }
}

async fn fetch_details(
    http: &reqwest::Client,
    config: &PlacesConfig,
    place_id: &str,
) -> Result<DetailRecord> {
    let response = http
        .get(format!("{}/details/json", config.base_url))
        .query(&[
            ("place_id", place_id),
            ("fields", DETAIL_FIELDS),
            ("key", config.api_key.as_str()),
        ])
        .timeout(config.timeout())
        .send()
        .await
        .map_err(ToolError::transport(SERVICE))?;

    if !response.status().is_success() {
        return Err(ToolError::Status {
            service: SERVICE,
            status: response.status().as_u16(),
        });
    }

    let body: DetailsResponse = response.json().await.map_err(ToolError::transport(SERVICE))?;
    if body.status != "OK" {
        return Err(provider_error(body.status, body.error_message));
    }
    body.result
        .ok_or_else(|| ToolError::NoData(format!("no details for place {place_id}")))
}

fn photo_url(config: &PlacesConfig, reference: &str) -> Option<String> {
    Url::parse_with_params(
        &format!("{}/photo", config.base_url),
        &[
            ("maxwidth", PHOTO_MAX_WIDTH),
            ("photoreference", reference),
            ("key", config.api_key.as_str()),
        ],
    )
    .ok()
    .map(String::from)
}

fn merge(config: &PlacesConfig, hit: NearbyHit, record: DetailRecord) -> PlaceDetails {
    PlaceDetails {
        place_id: hit.place_id,
        name: hit.name,
        simple_address: hit.vicinity,
        location: hit.geometry.map(|g| g.location),
        types: hit.types,
        formatted_address: record.formatted_address,
        international_phone_number: record.international_phone_number,
        website: record.website,
        rating: record.rating,
        opening_hours: record.opening_hours,
        photo_urls: record
            .photos
            .iter()
            .take(config.max_photos)
            .filter_map(|p| photo_url(config, &p.photo_reference))
            .collect(),
        price_level: record.price_level,
        business_status: record.business_status,
        url: record.url,
        user_ratings_total: record.user_ratings_total,
    }
}
