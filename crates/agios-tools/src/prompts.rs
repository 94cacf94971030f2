//! Prompt templates.
//!
//! Placeholders are written `{{name}}` and filled by [`render`]. Literal
//! single braces (JSON examples) pass through untouched.

use crate::config::Tuning;

pub const TOOL_DETECTOR: &str = r#"<goal>
You route user queries to a tool. Read the query, pick the single best tool from the list below and extract its parameters.
Answer with one JSON object and nothing else.
</goal>

<tools_available>
1. youtube_summary: the user wants a YouTube video summarized.
   - required: `video_url` (string), the full video URL.
2. weather_forecast: the user asks about the weather.
   - optional: `location` (string), e.g. "London" or "Paris, FR". Omit it when the user means their current location.
3. nearby_businesses: the user looks for businesses or points of interest near them or in a named area.
   - optional: `location` (string), the area to search.
   - optional: `business_type` (string), a category such as "cafe" or "restaurant".
   - optional: `keyword` (string), a name or search phrase such as "Starbucks".
4. general_search: anything else, including general knowledge questions. `params` is `{}`.
</tools_available>

<instructions>
- When the query is ambiguous, choose "general_search".
- For weather about "here", "nearby" or "today" with no place named, return empty params.
- Only include parameters that appear in the query.
</instructions>

<output_format>
{"tool": "tool_name", "params": {"param": "value"}}
`tool` is one of "youtube_summary", "weather_forecast", "nearby_businesses", "general_search".
</output_format>

<example_queries>
Query: "Can you summarize this video? https://www.youtube.com/watch?v=dQw4w9WgXcQ"
Output: {"tool": "youtube_summary", "params": {"video_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"}}

Query: "What's the weather like in Berlin?"
Output: {"tool": "weather_forecast", "params": {"location": "Berlin"}}

Query: "Weather today"
Output: {"tool": "weather_forecast", "params": {}}

Query: "Find me some coffee shops nearby."
Output: {"tool": "nearby_businesses", "params": {"business_type": "coffee shops"}}

Query: "Find me a Starbucks in downtown."
Output: {"tool": "nearby_businesses", "params": {"location": "downtown", "keyword": "Starbucks"}}

Query: "Tell me about Large Language Models."
Output: {"tool": "general_search", "params": {}}
</example_queries>

User Query:
{{user_query}}

Your JSON Output:"#;

pub const SEARCH_TERM: &str = r#"<prompt>
  <task>Extract the most specific search term from the input.</task>
  <instructions>
    <step>Identify the central subject of the user's query.</step>
    <step>Drop intent phrases and filler such as "how to", "best way to", "examples of".</step>
    <step>Return the core term in the JSON key "search_term".</step>
  </instructions>
  <input_string>{{text}}</input_string>
  <output_format>{"search_term": ["term"]}</output_format>
</prompt>"#;

pub const SUMMARY: &str = r#"<goal>
You extract structured, neutral facts from a text. Stay journalistic and never invent data.
</goal>

<instructions>
- key_takeaways: 3 to 5 standalone facts, each under 12 words, preferring numbers, dates and values.
  Give each a confidence_score between 80 and 99 (95-99 when the text states it plainly).
- related_search_terms: 3 to 6 lowercase terms of 1 to 4 words.
- short_summary: at most 3 lines.
- metrics: 3 to 7 entries with a title of at most 3 words and a short value, suitable for UI cards.
</instructions>

<output_format>
{
  "key_takeaways": [{"text": "Key takeaway statement.", "confidence_score": 96.5}],
  "related_search_terms": ["search term"],
  "short_summary": "Very short summary.",
  "metrics": [{"title": "Metric Title", "value": "Number or text"}]
}
</output_format>

<input>
{{input_text}}
</input>"#;

const TUNING_BLOCK: &str = r#"<tuning_instructions>
  Verbosity: {{verbosity}}
  Response Length: {{response_length}}
  Formality: {{formality}}
  Creativity: {{creativity}}
  Precision: {{precision}}
  User Instructions: {{user_instruction}}
</tuning_instructions>"#;

pub const WEATHER_SUMMARY: &str = r#"<goal>Summarize the weather forecast below for a person.</goal>
<instructions>
- Lead with the current conditions: temperature and general outlook.
- Mention the next one or two days briefly.
- Call out temperature ranges and significant precipitation.
- Write prose, do not list every field.
</instructions>
{{tuning}}
<weather_data>
{{weather_data}}
</weather_data>
Example: "Currently it's 25°C and sunny. Expect similar weather tomorrow with a high of 28°C."
Summary:"#;

pub const BUSINESS_SUMMARY: &str = r#"<goal>Give a brief overview of the nearby places found.</goal>
<instructions>
- State how many places were found and their main types.
- Point out highly rated or prominent places briefly.
- Do not list every business.
- If the user asked for a specific kind of place, focus on it.
</instructions>
{{tuning}}
<business_data>
{{business_data}}
</business_data>
Example: "Found 12 nearby places, including several cafes and a few highly rated restaurants."
Summary:"#;

pub const YOUTUBE_SUMMARY: &str = r#"<goal>Summarize the attached YouTube video.</goal>
<instructions>
- Cover the main topics and key takeaways.
- Keep it to 3 to 5 sentences unless the video is very long.
- Add no opinions that are not in the video.
- Start directly with the summary, no introductory phrase.
</instructions>
{{tuning}}
<video_url>
{{video_url}}
</video_url>
Summary:"#;

/// Replace every `{{key}}` with its value
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{key}}}}}"), value)
    })
}

fn tuning_block(tuning: &Tuning) -> String {
    render(
        TUNING_BLOCK,
        &[
            ("verbosity", tuning.verbosity.as_str()),
            ("response_length", tuning.response_length.as_str()),
            ("formality", tuning.formality.as_str()),
            ("creativity", tuning.creativity.as_str()),
            ("precision", tuning.precision.as_str()),
            ("user_instruction", tuning.user_instruction.as_str()),
        ],
    )
}

pub fn tool_detector(query: &str) -> String {
    render(TOOL_DETECTOR, &[("user_query", query)])
}

pub fn search_term(text: &str) -> String {
    render(SEARCH_TERM, &[("text", text)])
}

pub fn summary(input_text: &str) -> String {
    render(SUMMARY, &[("input_text", input_text)])
}

pub fn weather_summary(tuning: &Tuning, weather_data: &str) -> String {
    let tuning = tuning_block(tuning);
    render(
        WEATHER_SUMMARY,
        &[("tuning", tuning.as_str()), ("weather_data", weather_data)],
    )
}

pub fn business_summary(tuning: &Tuning, business_data: &str) -> String {
    let tuning = tuning_block(tuning);
    render(
        BUSINESS_SUMMARY,
        &[("tuning", tuning.as_str()), ("business_data", business_data)],
    )
}

pub fn youtube_summary(tuning: &Tuning, video_url: &str) -> String {
    let tuning = tuning_block(tuning);
    render(
        YOUTUBE_SUMMARY,
        &[("tuning", tuning.as_str()), ("video_url", video_url)],
    )
}
