//! # Gemini Live Session Adapter
//!
//! Opens and mediates one streaming Gemini Live session per interview
//! connection. The protocol is JSON over WebSocket: a `setup` message is
//! sent first, the service replies `setupComplete`, then audio flows up as
//! `realtimeInput` messages and transcription/audio events flow back as
//! `serverContent` messages.
//!
//! ## Structure
//!
//! `connect` performs setup, sends a synthetic first turn so the interviewer
//! speaks before the candidate, and then hands the socket to a spawned task.
//! The task owns the socket exclusively and multiplexes two sources with
//! `select!`: outbound commands from the connection's `LiveSession` handle,
//! and inbound frames from the service. Decoded events are pushed into an
//! unbounded channel that the WebSocket actor consumes as a stream, so the
//! client observes upstream events exactly in arrival order.
//!
//! Audio forwarding is best-effort: a failed send is logged and the chunk is
//! dropped, with no retry, since a retry could reorder audio.

use crate::error::{AppError, AppResult};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const GEMINI_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// MIME type of candidate audio: 16-bit PCM at 16 kHz.
pub const INPUT_AUDIO_MIME: &str = "audio/pcm;rate=16000";

/// Parameters for opening one live session.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub api_key: String,
    pub model: String,
    pub interview_target: String,
    /// Silence that ends the candidate's turn, in milliseconds
    pub silence_duration_ms: u64,
}

/// One event received from the live session, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamEvent {
    /// Transcribed candidate speech; moderation applies to this and only this
    InputTranscript(String),
    /// Transcribed AI speech
    OutputTranscript(String),
    /// A chunk of AI speech audio, base64-encoded
    Audio { data: String, mime_type: String },
    /// The AI finished its turn
    TurnComplete,
    /// Transport or protocol error; the session is not closed automatically
    UpstreamError(String),
    /// The service closed the session
    Closed,
}

/// Commands the connection sends to the session task.
#[derive(Debug)]
enum LiveCommand {
    Audio(String),
    Close,
}

/// Handle to an open live session.
///
/// Dropping the handle closes the command channel, which makes the session
/// task shut the socket down.
#[derive(Debug, Clone)]
pub struct LiveSession {
    cmd_tx: UnboundedSender<LiveCommand>,
}

impl LiveSession {
    /// Forward one base64 audio chunk. Best-effort: if the session task is
    /// gone the chunk is silently dropped.
    pub fn send_audio(&self, data: String) {
        if self.cmd_tx.send(LiveCommand::Audio(data)).is_err() {
            debug!("Live session task gone, dropping audio chunk");
        }
    }

    /// Ask the session task to close the upstream socket.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(LiveCommand::Close);
    }
}

/// Open a live session: connect, run setup, send the first turn, then spawn
/// the session task. Returns the command handle and the event stream.
pub async fn connect(config: LiveConfig) -> AppResult<(LiveSession, UnboundedReceiver<UpstreamEvent>)> {
    let url = format!("{}?key={}", GEMINI_LIVE_URL, config.api_key);

    let (mut ws, _) = connect_async(&url)
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to open Gemini Live session: {}", e)))?;

    let setup = setup_message(
        &config.model,
        &system_instruction(&config.interview_target),
        config.silence_duration_ms,
    );
    ws.send(Message::Text(setup.to_string()))
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to send session setup: {}", e)))?;

    // The service acknowledges setup before any content flows
    loop {
        match ws.next().await {
            Some(Ok(message)) => {
                if matches!(message, Message::Close(_)) {
                    return Err(AppError::Upstream(
                        "Gemini Live closed the session during setup".to_string(),
                    ));
                }
                if let Some(value) = decode_frame(&message) {
                    if is_setup_complete(&value) {
                        break;
                    }
                }
            }
            Some(Err(e)) => {
                return Err(AppError::Upstream(format!("Session setup failed: {}", e)))
            }
            None => {
                return Err(AppError::Upstream(
                    "Gemini Live closed the session during setup".to_string(),
                ))
            }
        }
    }

    // Synthetic first turn so the interviewer greets the candidate
    ws.send(Message::Text(initial_turn().to_string()))
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to send opening turn: {}", e)))?;

    info!(model = %config.model, target = %config.interview_target, "Gemini Live session open");

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_session(ws, cmd_rx, event_tx));

    Ok((LiveSession { cmd_tx }, event_rx))
}

/// Session task: owns the socket until close.
async fn run_session(
    mut ws: WsStream,
    mut cmd_rx: UnboundedReceiver<LiveCommand>,
    event_tx: UnboundedSender<UpstreamEvent>,
) {
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(LiveCommand::Audio(data)) => {
                    let message = audio_message(&data);
                    if let Err(e) = ws.send(Message::Text(message.to_string())).await {
                        // Dropped chunks are acceptable; no retry
                        warn!(error = %e, "Failed to forward audio chunk");
                    }
                }
                Some(LiveCommand::Close) | None => {
                    let _ = ws.close(None).await;
                    debug!("Live session closed by connection");
                    break;
                }
            },
            incoming = ws.next() => match incoming {
                Some(Ok(message)) => {
                    let closing = matches!(message, Message::Close(_));
                    if let Some(value) = decode_frame(&message) {
                        for event in events_from_message(&value) {
                            if event_tx.send(event).is_err() {
                                // Receiver gone means the client disconnected
                                let _ = ws.close(None).await;
                                return;
                            }
                        }
                    }
                    if closing {
                        let _ = event_tx.send(UpstreamEvent::Closed);
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Gemini Live stream error");
                    let _ = event_tx.send(UpstreamEvent::UpstreamError(e.to_string()));
                }
                None => {
                    let _ = event_tx.send(UpstreamEvent::Closed);
                    break;
                }
            }
        }
    }
}

/// Gemini Live frames carry JSON in either text or binary messages.
fn decode_frame(message: &Message) -> Option<Value> {
    match message {
        Message::Text(text) => serde_json::from_str(text).ok(),
        Message::Binary(bytes) => serde_json::from_slice(bytes).ok(),
        _ => None,
    }
}

fn is_setup_complete(value: &Value) -> bool {
    value.get("setupComplete").is_some()
}

/// Decode one `serverContent` message into ordered events.
///
/// A single message may carry several parts; their relative order is
/// preserved so the client sees them exactly as the service emitted them.
pub fn events_from_message(value: &Value) -> Vec<UpstreamEvent> {
    let mut events = Vec::new();

    let Some(content) = value.get("serverContent") else {
        return events;
    };

    if let Some(text) = content
        .pointer("/inputTranscription/text")
        .and_then(Value::as_str)
    {
        events.push(UpstreamEvent::InputTranscript(text.to_string()));
    }

    if let Some(text) = content
        .pointer("/outputTranscription/text")
        .and_then(Value::as_str)
    {
        events.push(UpstreamEvent::OutputTranscript(text.to_string()));
    }

    if let Some(parts) = content.pointer("/modelTurn/parts").and_then(Value::as_array) {
        for part in parts {
            let data = part.pointer("/inlineData/data").and_then(Value::as_str);
            let mime_type = part.pointer("/inlineData/mimeType").and_then(Value::as_str);
            if let (Some(data), Some(mime_type)) = (data, mime_type) {
                events.push(UpstreamEvent::Audio {
                    data: data.to_string(),
                    mime_type: mime_type.to_string(),
                });
            }
        }
    }

    if content.get("turnComplete").and_then(Value::as_bool) == Some(true) {
        events.push(UpstreamEvent::TurnComplete);
    }

    events
}

fn system_instruction(interview_target: &str) -> String {
    format!(
        "You are a professional interviewer conducting a mock interview for a candidate \
         preparing for {}. Greet the candidate briefly, then ask one question at a time \
         and wait for the answer before moving on. Keep questions relevant to {} and keep \
         your responses concise and spoken in a natural, encouraging tone.",
        interview_target, interview_target
    )
}

fn setup_message(model: &str, system_instruction: &str, silence_duration_ms: u64) -> Value {
    json!({
        "setup": {
            "model": format!("models/{}", model),
            "generationConfig": {
                "responseModalities": ["AUDIO"]
            },
            "systemInstruction": {
                "parts": [{ "text": system_instruction }]
            },
            "inputAudioTranscription": {},
            "outputAudioTranscription": {},
            "realtimeInputConfig": {
                "automaticActivityDetection": {
                    "silenceDurationMs": silence_duration_ms
                }
            }
        }
    })
}

fn audio_message(data: &str) -> Value {
    json!({
        "realtimeInput": {
            "audio": {
                "data": data,
                "mimeType": INPUT_AUDIO_MIME
            }
        }
    })
}

fn initial_turn() -> Value {
    json!({
        "clientContent": {
            "turns": [{
                "role": "user",
                "parts": [{ "text": "I am ready to begin the interview." }]
            }],
            "turnComplete": true
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_message_shape() {
        let setup = setup_message("gemini-2.0-flash-live-001", "Be an interviewer.", 2000);
        assert_eq!(setup["setup"]["model"], "models/gemini-2.0-flash-live-001");
        assert_eq!(setup["setup"]["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            setup["setup"]["realtimeInputConfig"]["automaticActivityDetection"]["silenceDurationMs"],
            2000
        );
        assert!(setup["setup"]["inputAudioTranscription"].is_object());
        assert!(setup["setup"]["outputAudioTranscription"].is_object());
    }

    #[test]
    fn test_audio_message_shape() {
        let message = audio_message("AAAA");
        assert_eq!(message["realtimeInput"]["audio"]["data"], "AAAA");
        assert_eq!(
            message["realtimeInput"]["audio"]["mimeType"],
            "audio/pcm;rate=16000"
        );
    }

    #[test]
    fn test_setup_complete_detection() {
        assert!(is_setup_complete(&json!({ "setupComplete": {} })));
        assert!(!is_setup_complete(&json!({ "serverContent": {} })));
    }

    #[test]
    fn test_events_input_transcription() {
        let value = json!({
            "serverContent": {
                "inputTranscription": { "text": "I studied mechanical engineering" }
            }
        });
        assert_eq!(
            events_from_message(&value),
            vec![UpstreamEvent::InputTranscript(
                "I studied mechanical engineering".to_string()
            )]
        );
    }

    #[test]
    fn test_events_audio_parts_preserve_order() {
        let value = json!({
            "serverContent": {
                "modelTurn": {
                    "parts": [
                        { "inlineData": { "data": "first", "mimeType": "audio/pcm;rate=24000" } },
                        { "text": "a non-audio part" },
                        { "inlineData": { "data": "second", "mimeType": "audio/pcm;rate=24000" } }
                    ]
                },
                "turnComplete": true
            }
        });
        let events = events_from_message(&value);
        assert_eq!(
            events,
            vec![
                UpstreamEvent::Audio {
                    data: "first".to_string(),
                    mime_type: "audio/pcm;rate=24000".to_string()
                },
                UpstreamEvent::Audio {
                    data: "second".to_string(),
                    mime_type: "audio/pcm;rate=24000".to_string()
                },
                UpstreamEvent::TurnComplete,
            ]
        );
    }

    #[test]
    fn test_events_ignore_unrelated_messages() {
        assert!(events_from_message(&json!({ "setupComplete": {} })).is_empty());
        assert!(events_from_message(&json!({ "usageMetadata": { "totalTokenCount": 10 } })).is_empty());
    }

    #[test]
    fn test_decode_frame_text_and_binary() {
        let text = Message::Text(r#"{"setupComplete":{}}"#.to_string());
        assert!(decode_frame(&text).is_some());

        let binary = Message::Binary(br#"{"serverContent":{}}"#.to_vec());
        assert!(decode_frame(&binary).is_some());

        assert!(decode_frame(&Message::Ping(Vec::new())).is_none());
    }
}
