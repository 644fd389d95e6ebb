//! # Interview Wire Protocol
//!
//! JSON message envelopes for the `/interview` WebSocket. Every message is
//! an object with a `type` discriminator; decoding happens once at the
//! socket boundary and the router matches exhaustively, so an unknown type
//! is a decode error rather than a silent fall-through.

use serde::{Deserialize, Serialize};

/// Messages the browser sends to the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Begin an interview for the given exam or role target.
    #[serde(rename_all = "camelCase")]
    StartInterview { interview_target: String },
    /// One chunk of base64-encoded PCM audio at 16 kHz.
    RealtimeInput { data: String },
    /// End the interview but keep the socket open.
    EndInterview,
}

/// Messages the server sends to the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Upstream session is ready; audio may now be sent.
    Connected { data: String },
    /// A chunk of AI speech audio.
    #[serde(rename_all = "camelCase")]
    AudioStream { data: String, mime_type: String },
    /// A fragment of the AI's speech transcript.
    TextStream { data: String },
    /// Moderation-triggered hard stop.
    TerminateForViolation { reason: String },
    /// Any failure the client should know about.
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
