//! Human-readable step labels carried by PLAN events.

pub const STARTED: &str = "Starting up the reasoning process.";
pub const ENDED: &str = "Finished with the reasoning.";
pub const MAKING_TOOL_DECISION: &str = "Deciding which tool fits best.";
pub const EXTRACTING_WEATHER: &str = "Extracting weather information.";
pub const EXTRACTING_NEARBY_PLACES: &str = "Finding nearby places of interest.";
pub const EXTRACTING_YT_TRANSCRIPT: &str = "Extracting transcript from the video.";
pub const EXTRACTING_SEARCH_TERM: &str = "Identifying the search term.";
pub const SEARCHING_WEB: &str = "Searching the web for relevant data.";
pub const SYNTHESIZING_RESULTS: &str = "Synthesizing everything into a final result.";

/// Label announcing that a specialized tool failed and web search takes over
pub fn falling_back(tool: &str) -> String {
    format!("The {tool} tool could not answer, falling back to a web search.")
}
