use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPEN_METEO_GEOCODE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const OPEN_METEO_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const GOOGLE_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
pub const TAVILY_BASE_URL: &str = "https://api.tavily.com";

/// Settings shared by every tool, grouped the way they appear in the
/// `[tools]` section of the service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub places: PlacesConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub default_location: DefaultLocation,
    #[serde(default)]
    pub tuning: Tuning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocode_url: default_geocode_url(),
            forecast_url: default_forecast_url(),
            timeout_secs: default_weather_timeout(),
            forecast_days: default_forecast_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// Filled from `GOOGLE_MAP_KEY`, never from files
    #[serde(skip)]
    pub api_key: String,
    #[serde(default = "default_places_url")]
    pub base_url: String,
    #[serde(default = "default_radius")]
    pub radius_m: u32,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_max_photos")]
    pub max_photos: usize,
    #[serde(default = "default_places_timeout")]
    pub timeout_secs: u64,
}

impl PlacesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_places_url(),
            radius_m: default_radius(),
            max_results: default_max_results(),
            max_photos: default_max_photos(),
            timeout_secs: default_places_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Filled from `TAVILY_API_KEY`
    #[serde(skip)]
    pub api_key: String,
    #[serde(default = "default_tavily_url")]
    pub base_url: String,
    #[serde(default = "default_search_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_tavily_url(),
            max_results: default_search_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// Location used when a weather or places query names none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultLocation {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for DefaultLocation {
    fn default() -> Self {
        Self {
            city: "San Francisco".to_string(),
            latitude: 37.7749,
            longitude: -122.4194,
        }
    }
}

/// Style knobs substituted into the synthesis prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    #[serde(default = "default_verbosity")]
    pub verbosity: String,
    #[serde(default = "default_response_length")]
    pub response_length: String,
    #[serde(default = "default_formality")]
    pub formality: String,
    #[serde(default = "default_creativity")]
    pub creativity: String,
    #[serde(default = "default_precision")]
    pub precision: String,
    #[serde(default)]
    pub user_instruction: String,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            verbosity: default_verbosity(),
            response_length: default_response_length(),
            formality: default_formality(),
            creativity: default_creativity(),
            precision: default_precision(),
            user_instruction: String::new(),
        }
    }
}

fn default_geocode_url() -> String {
    OPEN_METEO_GEOCODE_URL.to_string()
}

fn default_forecast_url() -> String {
    OPEN_METEO_FORECAST_URL.to_string()
}

fn default_weather_timeout() -> u64 {
    10
}

fn default_forecast_days() -> u32 {
    6
}

fn default_places_url() -> String {
    GOOGLE_PLACES_BASE_URL.to_string()
}

fn default_radius() -> u32 {
    1500
}

fn default_max_results() -> usize {
    10
}

fn default_max_photos() -> usize {
    3
}

fn default_places_timeout() -> u64 {
    10
}

fn default_tavily_url() -> String {
    TAVILY_BASE_URL.to_string()
}

fn default_search_results() -> usize {
    10
}

fn default_search_timeout() -> u64 {
    20
}

fn default_verbosity() -> String {
    "Be concise and to the point.".to_string()
}

fn default_response_length() -> String {
    "Keep it to a short paragraph.".to_string()
}

fn default_formality() -> String {
    "Use a friendly, neutral tone.".to_string()
}

fn default_creativity() -> String {
    "Stay factual, no embellishment.".to_string()
}

fn default_precision() -> String {
    "Include concrete numbers where available.".to_string()
}
