//! # Configuration Management
//!
//! Loads application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Special-case environment variables (GEMINI_API_KEY, HOST, PORT)
//! 2. Environment variables (APP_SERVER_HOST, APP_GEMINI_MODEL, ...)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)
//!
//! The Gemini API key is deliberately never serialized back out, so the
//! `/api/v1/config` endpoint cannot leak it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub interview: InterviewConfig,
    pub generation: GenerationConfig,
}

/// Server bind address.
///
/// - `host = "127.0.0.1"`: localhost only (development)
/// - `host = "0.0.0.0"`: accept connections from any address (production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Gemini API settings shared by the question generator (REST) and the
/// interview relay (Live API WebSocket).
///
/// ## Fields:
/// - `api_key`: Google AI Studio API key. Required at runtime for both
///   surfaces; its absence is a `ConfigurationError` when starting an
///   interview or generating questions, not at boot.
/// - `model`: text model for question generation (e.g. "gemini-2.5-flash")
/// - `live_model`: native-audio model for the interview relay
/// - `temperature`/`top_p`/`top_k`/`max_output_tokens`: generation knobs
/// - `request_timeout_secs`: REST call timeout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub live_model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
}

/// Mock-interview relay settings.
///
/// ## Fields:
/// - `silence_duration_ms`: silence threshold that ends a candidate turn
/// - `max_concurrent_interviews`: upper bound on simultaneous relay sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    pub silence_duration_ms: u32,
    pub max_concurrent_interviews: usize,
}

/// Question-generation tuning.
///
/// ## Fields:
/// - `safety_buffer`: extra questions requested per subject to absorb
///   validation failures
/// - `cache_ttl_secs` / `cache_max_entries`: generated-paper cache limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub safety_buffer: usize,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            gemini: GeminiConfig {
                api_key: None,
                model: "gemini-2.5-flash".to_string(),
                live_model: "gemini-2.0-flash-live-001".to_string(),
                temperature: 0.4,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 8192,
                request_timeout_secs: 120,
            },
            interview: InterviewConfig {
                silence_duration_ms: 2000,
                max_concurrent_interviews: 10,
            },
            generation: GenerationConfig {
                safety_buffer: 5,
                cache_ttl_secs: 3600,
                cache_max_entries: 1000,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config.toml, and the environment.
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER_HOST=0.0.0.0`: override server host
    /// - `APP_GEMINI_MODEL=gemini-2.5-pro`: override generation model
    /// - `GEMINI_API_KEY=...`: the API key (never read from config.toml)
    /// - `HOST` / `PORT`: deployment-platform conventions
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("_"));

        // Deployment platforms commonly inject these without the APP_ prefix
        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        if let Ok(key) = env::var("GEMINI_API_KEY") {
            settings = settings.set_override("gemini.api_key", key)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// A missing API key is allowed here: the server can boot without one and
    /// report `ConfigurationError` per request, which keeps local development
    /// of the non-Gemini surfaces possible.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            return Err(anyhow::anyhow!("Gemini temperature must be in 0.0..=2.0"));
        }

        if self.gemini.max_output_tokens == 0 {
            return Err(anyhow::anyhow!("Gemini max_output_tokens must be greater than 0"));
        }

        if self.interview.silence_duration_ms == 0 {
            return Err(anyhow::anyhow!("Interview silence duration must be greater than 0"));
        }

        if self.interview.max_concurrent_interviews == 0 {
            return Err(anyhow::anyhow!("Max concurrent interviews must be greater than 0"));
        }

        Ok(())
    }

    /// Apply a partial update from a JSON body (used by `PUT /api/v1/config`).
    ///
    /// Only the fields present in the JSON are changed; the API key is not
    /// updatable over HTTP. The result is re-validated before being accepted.
    pub fn update_from_json(&mut self, json_str: &str) -> Result<()> {
        let partial: serde_json::Value = serde_json::from_str(json_str)?;

        if let Some(server) = partial.get("server") {
            if let Some(host) = server.get("host").and_then(|v| v.as_str()) {
                self.server.host = host.to_string();
            }
            if let Some(port) = server.get("port").and_then(|v| v.as_u64()) {
                self.server.port = port as u16;
            }
        }

        if let Some(gemini) = partial.get("gemini") {
            if let Some(model) = gemini.get("model").and_then(|v| v.as_str()) {
                self.gemini.model = model.to_string();
            }
            if let Some(live_model) = gemini.get("live_model").and_then(|v| v.as_str()) {
                self.gemini.live_model = live_model.to_string();
            }
            if let Some(temperature) = gemini.get("temperature").and_then(|v| v.as_f64()) {
                self.gemini.temperature = temperature as f32;
            }
            if let Some(max_tokens) = gemini.get("max_output_tokens").and_then(|v| v.as_u64()) {
                self.gemini.max_output_tokens = max_tokens as u32;
            }
        }

        if let Some(interview) = partial.get("interview") {
            if let Some(silence) = interview.get("silence_duration_ms").and_then(|v| v.as_u64()) {
                self.interview.silence_duration_ms = silence as u32;
            }
            if let Some(max) = interview
                .get("max_concurrent_interviews")
                .and_then(|v| v.as_u64())
            {
                self.interview.max_concurrent_interviews = max as usize;
            }
        }

        if let Some(generation) = partial.get("generation") {
            if let Some(buffer) = generation.get("safety_buffer").and_then(|v| v.as_u64()) {
                self.generation.safety_buffer = buffer as usize;
            }
            if let Some(ttl) = generation.get("cache_ttl_secs").and_then(|v| v.as_u64()) {
                self.generation.cache_ttl_secs = ttl;
            }
            if let Some(max) = generation.get("cache_max_entries").and_then(|v| v.as_u64()) {
                self.generation.cache_max_entries = max as usize;
            }
        }

        self.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.interview.silence_duration_ms, 2000);
        assert!(config.gemini.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gemini.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.interview.max_concurrent_interviews = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_update() {
        let mut config = AppConfig::default();
        let json = r#"{"server": {"port": 9090}, "gemini": {"model": "gemini-2.5-pro"}}"#;
        assert!(config.update_from_json(json).is_ok());
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        // Untouched fields keep their values
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.interview.silence_duration_ms, 2000);
    }

    #[test]
    fn test_update_rejects_invalid_values() {
        let mut config = AppConfig::default();
        let json = r#"{"interview": {"silence_duration_ms": 0}}"#;
        assert!(config.update_from_json(json).is_err());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = AppConfig::default();
        config.gemini.api_key = Some("secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
