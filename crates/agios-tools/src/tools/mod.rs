mod places;
mod search;
mod weather;
mod youtube;

pub use places::NearbyPlacesTool;
pub use search::GeneralSearchTool;
pub use weather::WeatherTool;
pub use youtube::YoutubeSummaryTool;

/// Phrases the classifier passes through that mean "where I am"
const RELATIVE_LOCATIONS: [&str; 8] = [
    "here",
    "near me",
    "nearby",
    "around me",
    "around here",
    "my location",
    "current location",
    "my area",
];

pub(crate) fn is_relative_location(location: &str) -> bool {
    let normalized = location.trim().to_lowercase();
    RELATIVE_LOCATIONS.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_locations() {
        assert!(is_relative_location("Near me"));
        assert!(is_relative_location(" here "));
        assert!(!is_relative_location("Paris"));
    }
}
