pub mod geocode;
pub mod places;
pub mod tavily;
pub mod weather;
pub mod youtube;

pub use geocode::{Coordinates, Geocoder};
pub use places::{LatLng, NearbySearch, PlaceDetails, PlacesClient};
pub use tavily::{SearchResult, TavilyClient, WebSearchResponse};
pub use weather::{DailyWeather, WeatherClient, WeatherLocation};
pub use youtube::{find_video_url, validate_video_url};
