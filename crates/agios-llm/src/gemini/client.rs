// Gemini-specific client implementation

use crate::config::GeminiConfig;
use crate::error::{GenerationError, Result};
use crate::traits::{Attachment, Generation, GenerationClient, GenerationRequest, TokenUsage};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Gemini client (HTTP direct, no SDK)
pub struct GeminiClient {
    http_client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GenerationError::Config(e.to_string()))?;

        Ok(Self { http_client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url().trim_end_matches('/'),
            self.config.model
        )
    }

    /// Build the `parts` array: prompt text first, then every attachment
    async fn build_parts(&self, request: &GenerationRequest) -> Result<Vec<Value>> {
        let mut parts = vec![serde_json::json!({ "text": request.prompt })];

        for attachment in &request.attachments {
            match attachment {
                Attachment::File(path) => {
                    let data = tokio::fs::read(path).await.map_err(|source| {
                        GenerationError::Attachment {
                            path: path.display().to_string(),
                            source,
                        }
                    })?;

                    let mime_type = mime_from_extension(path).unwrap_or_else(|| {
                        tracing::warn!(
                            path = %path.display(),
                            "Could not determine MIME type by extension, using {}",
                            FALLBACK_MIME_TYPE
                        );
                        FALLBACK_MIME_TYPE
                    });

                    parts.push(serde_json::json!({
                        "inlineData": {
                            "mimeType": mime_type,
                            "data": STANDARD.encode(data),
                        }
                    }));
                }
                Attachment::Uri { uri, mime_type } => {
                    parts.push(serde_json::json!({
                        "fileData": {
                            "mimeType": mime_type,
                            "fileUri": uri,
                        }
                    }));
                }
            }
        }

        Ok(parts)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation> {
        if self.config.api_key.is_empty() {
            return Err(GenerationError::MissingCredential);
        }

        let parts = self.build_parts(&request).await?;
        let payload = serde_json::json!({
            "contents": [{ "role": "user", "parts": parts }],
        });

        tracing::debug!(
            model = %self.config.model,
            attachments = request.attachments.len(),
            "Sending generation request"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Provider { status, body });
        }

        let raw: GenerateContentResponse = response.json().await?;

        let text = raw
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .ok_or(GenerationError::NoCandidates)?;

        let usage = raw
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(Generation {
            text,
            usage,
            model: self.config.model.clone(),
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// MIME type for the attachment kinds the service accepts
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/md",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "xml" => "text/xml",
        "rtf" => "text/rtf",
        "js" => "text/javascript",
        "py" => "text/x-python",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "gif" => "image/gif",
        _ => return None,
    };
    Some(mime)
}

// ============================================================================
// GEMINI-SPECIFIC RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension(&PathBuf::from("a/b.PDF")), Some("application/pdf"));
        assert_eq!(mime_from_extension(&PathBuf::from("photo.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_from_extension(&PathBuf::from("archive.zip")), None);
        assert_eq!(mime_from_extension(&PathBuf::from("noext")), None);
    }

    #[test]
    fn test_endpoint_uses_model_and_base_url() {
        let client = GeminiClient::new(
            GeminiConfig::new("k")
                .with_model("gemini-test")
                .with_base_url("http://localhost:9999/v1beta/"),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
    }
}
