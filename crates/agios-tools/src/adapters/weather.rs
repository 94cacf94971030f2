use serde::{Deserialize, Serialize};

use crate::adapters::geocode::{Coordinates, Geocoder};
use crate::config::WeatherConfig;
use crate::error::{Result, ToolError};

const SERVICE: &str = "forecast";
const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_sum,windspeed_10m_max,sunrise,sunset";
const HOURLY_FIELDS: &str = "pressure_msl,relative_humidity_2m";

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherLocation {
    City(String),
    Coordinates(Coordinates),
}

/// One forecast day. Current-condition fields are only set on the day the
/// current observation falls on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_max_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_min_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windspeed_max_kmh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_current_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windspeed_current_kmh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winddirection_current_deg: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weathercode_current: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure_msl_current_hpa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_humidity_current_percent: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
    #[serde(default)]
    daily: DailySeries,
    #[serde(default)]
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    time: String,
    temperature: Option<f64>,
    windspeed: Option<f64>,
    winddirection: Option<f64>,
    weathercode: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct DailySeries {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    windspeed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    sunrise: Vec<Option<String>>,
    #[serde(default)]
    sunset: Vec<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct HourlySeries {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    pressure_msl: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
}

fn at<T: Clone>(series: &[Option<T>], i: usize) -> Option<T> {
    series.get(i).cloned().flatten()
}

/// Value of `series` at the hourly slot whose timestamp equals `target` exactly
fn align<T: Clone>(times: &[String], target: &str, series: &[Option<T>]) -> Option<T> {
    times
        .iter()
        .position(|t| t == target)
        .and_then(|i| at(series, i))
}

fn same_day(current_time: &str, date: &str) -> bool {
    current_time.get(..10).map_or(current_time.starts_with(date), |day| day == date)
}

fn assemble(payload: ForecastResponse) -> Result<Vec<DailyWeather>> {
    let daily = payload.daily;
    if daily.time.is_empty() {
        return Err(ToolError::NoData("no daily forecast data returned".to_string()));
    }

    let hourly = payload.hourly;
    let current = payload.current_weather;

    let days = daily
        .time
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let mut day = DailyWeather {
                date: date.clone(),
                temperature_max_c: at(&daily.temperature_2m_max, i),
                temperature_min_c: at(&daily.temperature_2m_min, i),
                precipitation_mm: at(&daily.precipitation_sum, i),
                windspeed_max_kmh: at(&daily.windspeed_10m_max, i),
                sunrise: at(&daily.sunrise, i),
                sunset: at(&daily.sunset, i),
                ..DailyWeather::default()
            };

            if let Some(current) = current.as_ref().filter(|c| same_day(&c.time, date)) {
                day.temperature_current_c = current.temperature;
                day.windspeed_current_kmh = current.windspeed;
                day.winddirection_current_deg = current.winddirection.map(|d| d.round() as i64);
                day.weathercode_current = current.weathercode.map(|c| c.round() as i64);
                day.pressure_msl_current_hpa = align(&hourly.time, &current.time, &hourly.pressure_msl);
                day.relative_humidity_current_percent =
                    align(&hourly.time, &current.time, &hourly.relative_humidity_2m)
                        .map(|h| h.round() as i64);
            }
            day
        })
        .collect();

    Ok(days)
}

/// Multi-day forecast client (Open-Meteo)
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    geocoder: Geocoder,
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(http: reqwest::Client, config: WeatherConfig) -> Self {
        let geocoder = Geocoder::new(http.clone(), config.geocode_url.clone(), config.timeout());
        Self {
            http,
            geocoder,
            config,
        }
    }

    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }

    pub async fn forecast(&self, location: &WeatherLocation) -> Result<Vec<DailyWeather>> {
        let coords = match location {
            WeatherLocation::Coordinates(coords) => *coords,
            WeatherLocation::City(city) if city.trim().is_empty() => {
                return Err(ToolError::MissingParameter("location"));
            }
            WeatherLocation::City(city) => self.geocoder.lookup(city.trim()).await?,
        };

        let latitude = format!("{:.4}", coords.latitude);
        let longitude = format!("{:.4}", coords.longitude);
        let days = self.config.forecast_days.to_string();

        let response = self
            .http
            .get(&self.config.forecast_url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("timezone", "auto"),
                ("current_weather", "true"),
                ("daily", DAILY_FIELDS),
                ("hourly", HOURLY_FIELDS),
                ("forecast_days", days.as_str()),
            ])
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

        let payload: ForecastResponse = response.json().await.map_err(ToolError::transport(SERVICE))?;
        assemble(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> ForecastResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_current_conditions_land_on_matching_day() {
        let days = assemble(payload(serde_json::json!({
            "current_weather": {"time": "2024-05-02T14:00", "temperature": 18.5, "windspeed": 9.0, "winddirection": 270, "weathercode": 3},
            "daily": {
                "time": ["2024-05-01", "2024-05-02"],
                "temperature_2m_max": [20.0, 21.0],
                "temperature_2m_min": [10.0, null],
                "sunrise": ["2024-05-01T06:00", "2024-05-02T05:58"]
            },
            "hourly": {
                "time": ["2024-05-02T13:00", "2024-05-02T14:00"],
                "pressure_msl": [1012.0, 1013.5],
                "relative_humidity_2m": [60, 55]
            }
        })))
        .unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].temperature_current_c, None);
        assert_eq!(days[1].temperature_current_c, Some(18.5));
        assert_eq!(days[1].winddirection_current_deg, Some(270));
        assert_eq!(days[1].pressure_msl_current_hpa, Some(1013.5));
        assert_eq!(days[1].relative_humidity_current_percent, Some(55));
        assert_eq!(days[1].temperature_min_c, None);
        assert_eq!(days[0].precipitation_mm, None);
    }

    #[test]
    fn test_unaligned_current_time_leaves_hourly_fields_empty() {
        let days = assemble(payload(serde_json::json!({
            "current_weather": {"time": "2024-05-01T14:15", "temperature": 18.5},
            "daily": {"time": ["2024-05-01"]},
            "hourly": {"time": ["2024-05-01T14:00"], "pressure_msl": [1013.5]}
        })))
        .unwrap();

        assert_eq!(days[0].temperature_current_c, Some(18.5));
        assert_eq!(days[0].pressure_msl_current_hpa, None);
    }

    #[test]
    fn test_empty_daily_series_is_an_error() {
        let err = assemble(payload(serde_json::json!({"daily": {"time": []}}))).unwrap_err();
        assert!(matches!(err, ToolError::NoData(_)));
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let day = DailyWeather {
            date: "2024-05-01".to_string(),
            temperature_max_c: Some(20.0),
            ..DailyWeather::default()
        };
        assert_eq!(
            serde_json::to_value(&day).unwrap(),
            serde_json::json!({"date": "2024-05-01", "temperature_max_c": 20.0})
        );
    }
}
