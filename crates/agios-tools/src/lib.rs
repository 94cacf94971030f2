pub mod adapters;
pub mod classifier;
pub mod config;
pub mod cot;
pub mod error;
pub mod extract;
pub mod kind;
pub mod prompts;
pub mod tool;
pub mod tools;

pub use adapters::{
    Coordinates, DailyWeather, Geocoder, PlaceDetails, PlacesClient, TavilyClient, WeatherClient,
    WeatherLocation, WebSearchResponse,
};
pub use classifier::{classify, ToolSelection};
pub use config::{DefaultLocation, PlacesConfig, SearchConfig, ToolsConfig, Tuning, WeatherConfig};
pub use error::{Result, ToolError};
pub use extract::{extract_search_terms, extract_summary, SearchTerms, Summary};
pub use kind::ToolKind;
pub use tool::{EventSink, Tool, ToolOutput, ToolRegistry, ToolRequest};
pub use tools::{GeneralSearchTool, NearbyPlacesTool, WeatherTool, YoutubeSummaryTool};
