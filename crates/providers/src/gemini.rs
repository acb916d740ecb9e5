//! Gemini `generateContent` gateway.
//!
//! Sends a single user turn containing the fully assembled prompt and
//! returns the first candidate's first text part, cleaned for display.
//!
//! Tolerated: an empty body and missing `candidates` / `content` / `parts` /
//! `text` fields all yield an empty reply. Non-2xx statuses and bodies that
//! are not JSON are errors.

use async_trait::async_trait;
use greenbible_config::AppConfig;
use greenbible_core::error::GatewayError;
use greenbible_core::model::LanguageModel;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::format::clean_reply;

/// A Gemini-backed language model gateway.
pub struct GeminiGateway {
    endpoint: String,
    model: String,
    api_key: String,
    user_agent: String,
    client: reqwest::Client,
}

impl GeminiGateway {
    /// Create a new gateway.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            user_agent: user_agent.into(),
            client,
        })
    }

    /// Build the gateway from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GatewayError::NotConfigured("no API key configured".into()))?;

        Self::new(
            &config.gemini.endpoint,
            &config.gemini.model,
            api_key,
            &config.gemini.user_agent,
            Duration::from_secs(config.gemini.timeout_secs),
        )
    }

    /// The `generateContent` URL for the configured model (without the key).
    pub fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }

    fn request_body(prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }],
                }
            ]
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiGateway {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn send(&self, prompt: &str) -> Result<String, GatewayError> {
        let url = self.url();
        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header(USER_AGENT, &self.user_agent)
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!(status, body = %raw, "Gemini returned error");
            return Err(GatewayError::Http {
                status,
                body: if raw.is_empty() {
                    "No response body".into()
                } else {
                    raw
                },
            });
        }

        let text = extract_reply_text(&raw)?;
        Ok(clean_reply(&text))
    }
}

/// Pull the first candidate's first text part out of a response body.
pub fn extract_reply_text(raw: &str) -> Result<String, GatewayError> {
    if raw.trim().is_empty() {
        return Ok(String::new());
    }

    let payload: GenerateResponse = serde_json::from_str(raw)
        .map_err(|e| GatewayError::MalformedPayload(e.to_string()))?;

    let text = payload
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .unwrap_or_default();

    Ok(text)
}

// --- Gemini API types (internal) ---

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}
