use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::SearchConfig;
use crate::error::{Result, ToolError};

const SERVICE: &str = "web search";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl WebSearchResponse {
    /// Plain-text digest handed to the summarizer
    pub fn digest(&self) -> String {
        let mut out = String::new();
        if let Some(answer) = self.answer.as_deref().filter(|a| !a.trim().is_empty()) {
            out.push_str(answer.trim());
            out.push_str("\n\n");
        }
        for result in &self.results {
            out.push_str(&format!("## {}\n{}\n{}\n\n", result.title, result.url, result.content));
        }
        out.trim_end().to_string()
    }
}

/// Tavily web search client
#[derive(Debug, Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl TavilyClient {
    pub fn new(http: reqwest::Client, config: SearchConfig) -> Self {
        Self { http, config }
    }

    pub async fn search(&self, query: &str) -> Result<WebSearchResponse> {
        if self.config.api_key.is_empty() {
            return Err(ToolError::MissingCredential("TAVILY_API_KEY"));
        }

        let response = self
            .http
            .post(format!("{}/search", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "query": query,
                "max_results": self.config.max_results,
                "include_answer": true,
                "include_images": true,
            }))
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

        let body: WebSearchResponse = response.json().await.map_err(ToolError::transport(SERVICE))?;
        tracing::debug!(query, results = body.results.len(), "web search complete");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_includes_answer_and_results() {
        let response = WebSearchResponse {
            answer: Some("Rust is a language.".to_string()),
            results: vec![SearchResult {
                title: "Rust".to_string(),
                url: "https://rust-lang.org".to_string(),
                content: "Fast and safe.".to_string(),
                score: 0.9,
            }],
            images: vec![],
        };
        assert_eq!(
            response.digest(),
            "Rust is a language.\n\n## Rust\nhttps://rust-lang.org\nFast and safe."
        );
    }
}
