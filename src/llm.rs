//! Generative model client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A model that turns text segments into generated text
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// One generation call; segments are sent in order as a single turn
    async fn generate(&self, segments: &[String], temperature: f32) -> Result<String>;

    /// Model identifier reported in status
    fn model_name(&self) -> &str;
}

/// Google Gemini client using the `generateContent` REST endpoint
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client; a missing or blank key fails before any request is made
    pub fn new(
        api_key: Option<String>,
        model_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("GEMINI_API_KEY is not set"))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model_name: model_name.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Build a client from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::new(
            config.gemini_api_key.clone(),
            config.model_name.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        tracing::info!(model = %client.model_name, "Generative model client ready");
        Ok(client)
    }

    /// Point the client at a different API root (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model_name
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

fn build_request(segments: &[String], temperature: f32) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: segments
                .iter()
                .map(|text| GeminiPart { text: text.clone() })
                .collect(),
        }],
        generation_config: GeminiGenerationConfig { temperature },
    }
}

fn response_text(response: GeminiResponse) -> Result<String> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| Error::generation("Model returned no candidates"))?;

    Ok(content.parts.into_iter().map(|p| p.text).collect())
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, segments: &[String], temperature: f32) -> Result<String> {
        let request = build_request(segments, temperature);

        tracing::debug!(model = %self.model_name, segments = segments.len(), "Calling model");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(format!("Gemini API error {}: {}", status, body)));
        }

        response_text(response.json::<GeminiResponse>().await?)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = GeminiClient::new(None, "gemini-2.5-flash", Duration::from_secs(5))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = GeminiClient::new(Some("  ".into()), "gemini-2.5-flash", Duration::from_secs(5))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(Some("k".into()), "gemini-2.5-flash", Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_carries_segments_and_temperature() {
        let request = build_request(&["persona".to_string(), "task".to_string()], 0.5);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "persona"}, {"text": "task"}]}],
                "generationConfig": {"temperature": 0.5}
            })
        );
    }

    #[test]
    fn response_parts_are_concatenated() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "1. Call "}, {"text": "client"}]}}]
        }))
        .unwrap();
        assert_eq!(response_text(response).unwrap(), "1. Call client");
    }

    #[test]
    fn empty_candidates_is_a_generation_error() {
        let response: GeminiResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert_eq!(response_text(response).unwrap_err().kind(), ErrorKind::Generation);

        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response_text(response).unwrap_err().kind(), ErrorKind::Generation);
    }
}
