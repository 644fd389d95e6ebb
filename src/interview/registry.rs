//! # Interview Connection Registry
//!
//! Tracks every open `/interview` WebSocket connection and its lifecycle
//! state. Each connection owns at most one upstream Gemini Live session at a
//! time; the registry records whether one is open but never holds the
//! session itself.
//!
//! ## Connection Lifecycle
//! 1. **Idle**: socket open, no upstream session
//! 2. **Active**: upstream session open, audio flowing
//! 3. **Closed**: terminal; socket gone or moderation forced termination

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Lifecycle state of one interview connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Active,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Active => "active",
            ConnectionState::Closed => "closed",
        }
    }
}

/// Registry-side record of one connection.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: Uuid,
    pub state: ConnectionState,
    /// Target the candidate is interviewing for, set on Start
    pub interview_target: Option<String>,
    pub connected_at: DateTime<Utc>,
}

/// Thread-safe registry of active interview connections.
///
/// Created once at startup and shared via `web::Data`; every WebSocket actor
/// registers itself on connect and deregisters on close.
pub struct InterviewRegistry {
    connections: Arc<RwLock<HashMap<Uuid, ConnectionInfo>>>,
    max_concurrent: usize,
}

impl InterviewRegistry {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            max_concurrent,
        }
    }

    /// Register a new connection in the Idle state.
    pub fn register(&self) -> Result<Uuid, String> {
        let mut connections = self.connections.write().unwrap();

        if connections.len() >= self.max_concurrent {
            return Err(format!(
                "Maximum concurrent interviews ({}) reached",
                self.max_concurrent
            ));
        }

        let id = Uuid::new_v4();
        connections.insert(
            id,
            ConnectionInfo {
                id,
                state: ConnectionState::Idle,
                interview_target: None,
                connected_at: Utc::now(),
            },
        );

        Ok(id)
    }

    /// Idle -> Active, recording the interview target. Fails if the
    /// connection is unknown, already Active, or Closed.
    pub fn activate(&self, id: Uuid, interview_target: &str) -> Result<(), String> {
        let mut connections = self.connections.write().unwrap();
        let info = connections
            .get_mut(&id)
            .ok_or_else(|| format!("Unknown connection: {}", id))?;

        match info.state {
            ConnectionState::Idle => {
                info.state = ConnectionState::Active;
                info.interview_target = Some(interview_target.to_string());
                Ok(())
            }
            ConnectionState::Active => Err("Interview already in progress".to_string()),
            ConnectionState::Closed => Err("Connection is closed".to_string()),
        }
    }

    /// Active -> Idle on End. Idempotent: already-Idle is fine. Closed stays
    /// Closed.
    pub fn deactivate(&self, id: Uuid) {
        let mut connections = self.connections.write().unwrap();
        if let Some(info) = connections.get_mut(&id) {
            if info.state == ConnectionState::Active {
                info.state = ConnectionState::Idle;
            }
        }
    }

    /// Terminal transition. Any state -> Closed.
    pub fn close(&self, id: Uuid) {
        let mut connections = self.connections.write().unwrap();
        if let Some(info) = connections.get_mut(&id) {
            info.state = ConnectionState::Closed;
        }
    }

    /// Drop the record entirely once the socket is gone.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut connections = self.connections.write().unwrap();
        connections.remove(&id).is_some()
    }

    pub fn state(&self, id: Uuid) -> Option<ConnectionState> {
        let connections = self.connections.read().unwrap();
        connections.get(&id).map(|info| info.state)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.read().unwrap().len()
    }

    /// Connections currently in an Active interview.
    pub fn active_count(&self) -> usize {
        let connections = self.connections.read().unwrap();
        connections
            .values()
            .filter(|info| info.state == ConnectionState::Active)
            .count()
    }

    pub fn get(&self, id: Uuid) -> Option<ConnectionInfo> {
        let connections = self.connections.read().unwrap();
        connections.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lifecycle() {
        let registry = InterviewRegistry::new(10);
        let id = registry.register().unwrap();
        assert_eq!(registry.state(id), Some(ConnectionState::Idle));

        registry.activate(id, "UPSC Civil Services").unwrap();
        assert_eq!(registry.state(id), Some(ConnectionState::Active));
        assert_eq!(
            registry.get(id).unwrap().interview_target.as_deref(),
            Some("UPSC Civil Services")
        );

        registry.deactivate(id);
        assert_eq!(registry.state(id), Some(ConnectionState::Idle));

        registry.close(id);
        assert_eq!(registry.state(id), Some(ConnectionState::Closed));
        assert!(registry.remove(id));
        assert_eq!(registry.state(id), None);
    }

    #[test]
    fn test_double_start_rejected() {
        let registry = InterviewRegistry::new(10);
        let id = registry.register().unwrap();
        registry.activate(id, "JEE Advanced").unwrap();
        assert!(registry.activate(id, "NEET").is_err());
        // Still Active with the original target
        assert_eq!(registry.state(id), Some(ConnectionState::Active));
        assert_eq!(
            registry.get(id).unwrap().interview_target.as_deref(),
            Some("JEE Advanced")
        );
    }

    #[test]
    fn test_double_end_is_a_no_op() {
        let registry = InterviewRegistry::new(10);
        let id = registry.register().unwrap();
        registry.activate(id, "Bank PO").unwrap();
        registry.deactivate(id);
        registry.deactivate(id);
        assert_eq!(registry.state(id), Some(ConnectionState::Idle));
    }

    #[test]
    fn test_closed_is_terminal() {
        let registry = InterviewRegistry::new(10);
        let id = registry.register().unwrap();
        registry.close(id);
        assert!(registry.activate(id, "SSC").is_err());
        registry.deactivate(id);
        assert_eq!(registry.state(id), Some(ConnectionState::Closed));
    }

    #[test]
    fn test_connection_limit() {
        let registry = InterviewRegistry::new(2);
        registry.register().unwrap();
        registry.register().unwrap();
        assert!(registry.register().is_err());
        assert_eq!(registry.connection_count(), 2);
    }

    #[test]
    fn test_active_count() {
        let registry = InterviewRegistry::new(10);
        let a = registry.register().unwrap();
        let _b = registry.register().unwrap();
        registry.activate(a, "GATE").unwrap();
        assert_eq!(registry.connection_count(), 2);
        assert_eq!(registry.active_count(), 1);
    }
}
