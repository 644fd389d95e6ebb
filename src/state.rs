//! # Application State Management
//!
//! Shared state accessed by every HTTP handler and WebSocket actor:
//! runtime-updatable configuration, request/interview metrics, a shared
//! `reqwest` client for the Gemini REST API, and the server start time.
//!
//! All mutable data sits behind `Arc<RwLock<T>>` so concurrent requests can
//! read freely while config updates and metric writes stay exclusive.

use crate::config::AppConfig;
use crate::questions::cache::PaperCache;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// The main application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration (can be updated at runtime)
    pub config: Arc<RwLock<AppConfig>>,

    /// Request and interview metrics, updated by the metrics middleware and
    /// the interview WebSocket actor
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// Shared HTTP client for Gemini REST calls; reqwest clients pool
    /// connections internally, so one per process is enough
    pub http: reqwest::Client,

    /// Cache of generated papers keyed by the full generation request
    pub question_cache: Arc<RwLock<PaperCache>>,

    /// When the server started
    pub start_time: Instant,
}

/// Metrics collected across all HTTP requests and interview sessions.
#[derive(Debug, Default)]
pub struct AppMetrics {
    /// Total number of HTTP requests processed since server start
    pub request_count: u64,

    /// Total number of errors encountered since server start
    pub error_count: u64,

    /// Current number of active interview relay sessions
    pub active_interviews: u32,

    /// Total questions generated since server start
    pub questions_generated: u64,

    /// Per-endpoint statistics, keyed by "METHOD /path"
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

/// Per-endpoint performance counters.
#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    pub total_duration_ms: u64,
    pub error_count: u64,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let cache = PaperCache::new(
            config.generation.cache_ttl_secs,
            config.generation.cache_max_entries,
        );
        Self {
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            http: reqwest::Client::new(),
            question_cache: Arc::new(RwLock::new(cache)),
            start_time: Instant::now(),
        }
    }

    /// Get a copy of the current configuration.
    ///
    /// Cloning releases the read lock immediately so other threads aren't
    /// blocked; AppConfig is cheap to clone.
    pub fn get_config(&self) -> AppConfig {
        self.config.read().unwrap().clone()
    }

    /// Replace the configuration after validating it.
    pub fn update_config(&self, new_config: AppConfig) -> Result<(), String> {
        match new_config.validate() {
            Ok(_) => {
                *self.config.write().unwrap() = new_config;
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn increment_request_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.request_count += 1;
    }

    pub fn increment_error_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.error_count += 1;
    }

    /// Record a completed request against its endpoint's counters.
    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.metrics.write().unwrap();
        let endpoint_metric = metrics.endpoint_metrics.entry(endpoint.to_string()).or_default();

        endpoint_metric.request_count += 1;
        endpoint_metric.total_duration_ms += duration_ms;

        if is_error {
            endpoint_metric.error_count += 1;
        }
    }

    /// Called when an interview WebSocket connection starts.
    pub fn increment_active_interviews(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.active_interviews += 1;
    }

    /// Called when an interview WebSocket connection ends.
    pub fn decrement_active_interviews(&self) {
        let mut metrics = self.metrics.write().unwrap();
        // Underflow guard: u32 would panic on wrap in debug builds
        if metrics.active_interviews > 0 {
            metrics.active_interviews -= 1;
        }
    }

    pub fn record_questions_generated(&self, count: u64) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.questions_generated += count;
    }

    /// Snapshot of current metrics for the /metrics endpoint. Clones the data
    /// so no lock is held while the HTTP response is serialized.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        let metrics = self.metrics.read().unwrap();
        AppMetrics {
            request_count: metrics.request_count,
            error_count: metrics.error_count,
            active_interviews: metrics.active_interviews,
            questions_generated: metrics.questions_generated,
            endpoint_metrics: metrics.endpoint_metrics.clone(),
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl EndpointMetric {
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_interview_counter() {
        let state = AppState::new(AppConfig::default());
        state.increment_active_interviews();
        state.increment_active_interviews();
        state.decrement_active_interviews();
        assert_eq!(state.get_metrics_snapshot().active_interviews, 1);

        // Never underflows
        state.decrement_active_interviews();
        state.decrement_active_interviews();
        assert_eq!(state.get_metrics_snapshot().active_interviews, 0);
    }

    #[test]
    fn test_endpoint_metrics() {
        let state = AppState::new(AppConfig::default());
        state.record_endpoint_request("POST /api/v1/questions/generate", 120, false);
        state.record_endpoint_request("POST /api/v1/questions/generate", 80, true);

        let snapshot = state.get_metrics_snapshot();
        let metric = &snapshot.endpoint_metrics["POST /api/v1/questions/generate"];
        assert_eq!(metric.request_count, 2);
        assert_eq!(metric.error_count, 1);
        assert_eq!(metric.average_duration_ms(), 100.0);
        assert_eq!(metric.error_rate(), 0.5);
    }
}
