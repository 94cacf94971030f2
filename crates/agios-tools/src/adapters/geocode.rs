use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, ToolError};

const SERVICE: &str = "geocoding";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    // Omitted entirely when nothing matches
    #[serde(default)]
    results: Vec<GeocodeHit>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    latitude: f64,
    longitude: f64,
}

/// City name to coordinates lookup (Open-Meteo geocoding)
#[derive(Debug, Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl Geocoder {
    pub fn new(http: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            timeout,
        }
    }

    /// Best match for `city`; no match is `LocationNotFound`
    pub async fn lookup(&self, city: &str) -> Result<Coordinates> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("name", city), ("count", "1")])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ToolError::transport(SERVICE))?;

        if !response.status().is_success() {
            return Err(ToolError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let body: GeocodeResponse = response.json().await.map_err(ToolError::transport(SERVICE))?;
        let hit = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::LocationNotFound(city.to_string()))?;

        tracing::debug!(city, latitude = hit.latitude, longitude = hit.longitude, "geocoded");
        Ok(Coordinates::new(hit.latitude, hit.longitude))
    }
}
