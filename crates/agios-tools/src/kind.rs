use serde::{Deserialize, Serialize};
use std::fmt;

/// Tools the classifier may select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    YoutubeSummary,
    WeatherForecast,
    NearbyBusinesses,
    GeneralSearch,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        Self::YoutubeSummary,
        Self::WeatherForecast,
        Self::NearbyBusinesses,
        Self::GeneralSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YoutubeSummary => "youtube_summary",
            Self::WeatherForecast => "weather_forecast",
            Self::NearbyBusinesses => "nearby_businesses",
            Self::GeneralSearch => "general_search",
        }
    }

    /// Exact vocabulary match; anything else is unknown
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name.trim())
    }

    /// Specialized tools fall back to web search when they fail
    pub fn is_specialized(&self) -> bool {
        !matches!(self, Self::GeneralSearch)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vocabulary() {
        assert_eq!(ToolKind::parse("weather_forecast"), Some(ToolKind::WeatherForecast));
        assert_eq!(ToolKind::parse(" general_search "), Some(ToolKind::GeneralSearch));
        assert_eq!(ToolKind::parse("crypto_prices"), None);
        assert_eq!(ToolKind::parse(""), None);
    }

    #[test]
    fn test_serde_matches_as_str() {
        for kind in ToolKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), serde_json::json!(kind.as_str()));
        }
    }
}
