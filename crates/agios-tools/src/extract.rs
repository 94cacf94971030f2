//! LLM-backed structured extraction (search terms and result summaries).

use agios_llm::{generate_structured, Attachment, GenerationClient, GenerationRequest, Structured};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::prompts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTerms {
    #[serde(default)]
    pub search_term: Vec<String>,
}

impl SearchTerms {
    /// First non-blank term
    pub fn primary(&self) -> Option<&str> {
        self.search_term
            .iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyTakeaway {
    pub text: String,
    #[serde(default)]
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub title: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub key_takeaways: Vec<KeyTakeaway>,
    #[serde(default)]
    pub related_search_terms: Vec<String>,
    #[serde(default)]
    pub short_summary: String,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl Summary {
    /// Markdown answer: the short summary followed by the takeaways
    pub fn to_markdown(&self) -> String {
        let mut out = self.short_summary.trim().to_string();
        if !self.key_takeaways.is_empty() {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str("**Key takeaways**\n");
            for takeaway in &self.key_takeaways {
                out.push_str(&format!("\n- {}", takeaway.text.trim()));
            }
        }
        out
    }
}

// Models sometimes emit metric values as bare numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

pub async fn extract_search_terms(
    client: &dyn GenerationClient,
    text: &str,
) -> Result<Structured<SearchTerms>> {
    let request = GenerationRequest::new(prompts::search_term(text));
    Ok(generate_structured(client, request).await?)
}

/// Summarize `text`; attachments (uploaded files) are sent alongside the prompt
pub async fn extract_summary(
    client: &dyn GenerationClient,
    text: &str,
    attachments: &[Attachment],
) -> Result<Structured<Summary>> {
    let request =
        GenerationRequest::new(prompts::summary(text)).with_attachments(attachments.to_vec());
    Ok(generate_structured(client, request).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_search_term_skips_blanks() {
        let terms = SearchTerms {
            search_term: vec![" ".to_string(), "rust async".to_string()],
        };
        assert_eq!(terms.primary(), Some("rust async"));
        assert_eq!(SearchTerms { search_term: vec![] }.primary(), None);
    }

    #[test]
    fn test_summary_accepts_numeric_metric_values() {
        let summary: Summary = serde_json::from_str(
            r#"{
                "key_takeaways": [{"text": "GDP grew 3%", "confidence_score": 97}],
                "related_search_terms": ["gdp"],
                "short_summary": "Growth was strong.",
                "metrics": [{"title": "Growth", "value": 3.1}]
            }"#,
        )
        .unwrap();

        assert_eq!(summary.metrics[0].value, "3.1");
        assert_eq!(
            summary.to_markdown(),
            "Growth was strong.\n\n**Key takeaways**\n\n- GDP grew 3%"
        );
    }
}
