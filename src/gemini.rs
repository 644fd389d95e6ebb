//! # Gemini REST Client
//!
//! Thin client for the Gemini `generateContent` REST API, used by the
//! question generator. The interview relay uses the separate Live API
//! WebSocket client in `interview::session`.
//!
//! One request, one prompt, one text response; retries are left to the
//! caller's discretion (the generator treats a failed subject as skippable
//! rather than retrying).

use crate::config::GeminiConfig;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    generation_config: GenerationConfigBody,
    timeout: Duration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigBody {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfigBody,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    /// Build a client from the current Gemini configuration.
    ///
    /// Fails with `ConfigError` if no API key is configured; callers surface
    /// that to the user and may retry after the key is supplied.
    pub fn from_config(http: reqwest::Client, config: &GeminiConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::ConfigError("GEMINI_API_KEY is not configured".to_string()))?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            generation_config: GenerationConfigBody {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                max_output_tokens: config.max_output_tokens,
            },
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Send a single prompt and return the concatenated text of the first
    /// candidate's parts.
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: self.generation_config.clone(),
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Calling Gemini generateContent");

        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Gemini returned {}: {}",
                status, detail
            )));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = extract_text(&parsed);

        if text.is_empty() {
            return Err(AppError::Upstream(
                "Gemini returned an empty response".to_string(),
            ));
        }

        debug!(response_chars = text.len(), "Gemini response received");
        Ok(text)
    }
}

fn extract_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}
