//! # Interview Relay
//!
//! Real-time mock-interview pipeline: a browser streams candidate audio over
//! the `/interview` WebSocket, the relay forwards it to a Gemini Live
//! session, and AI speech plus transcript fragments stream back. A
//! moderation filter sits on the candidate-transcript path and hard-stops
//! the interview on a violation.
//!
//! ```text
//! browser <-ws-> websocket (actor) <-channels-> session (task) <-ws-> Gemini Live
//!                     |
//!                 moderation
//! ```

pub mod messages;
pub mod moderation;
pub mod registry;
pub mod session;
pub mod websocket;
