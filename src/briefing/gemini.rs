use super::TextGenerator;
use crate::config::BriefingConfig;
use crate::error::GenerationError;
use crate::http_client::HttpClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Google Gemini `generateContent` REST client.
pub struct GeminiClient {
    client: HttpClient,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(client: HttpClient, config: &BriefingConfig, api_key: impl Into<String>) -> Self {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_base_url.trim_end_matches('/'),
            config.model
        );
        Self {
            client,
            endpoint,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        info!("🤖 Sending prompt to {}", self.endpoint);

        let req = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt.to_string() }],
            }],
        };

        let resp = self
            .client
            .inner()
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: truncate(&body, 300),
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed.text().ok_or(GenerationError::EmptyResponse)?;
        info!("🤖 Briefing received ({} chars)", text.chars().count());
        Ok(text)
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
