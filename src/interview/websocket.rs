//! # Interview WebSocket Handler
//!
//! The `/interview` endpoint. Each connection is an Actix actor that routes
//! client messages to the Gemini Live session adapter and forwards upstream
//! events back to the browser.
//!
//! ## Protocol
//! 1. **Connection**: client connects; the actor registers itself as Idle
//! 2. **Start**: `startInterview` opens the upstream session; on success the
//!    client receives `connected` and the connection becomes Active
//! 3. **Audio**: `realtimeInput` chunks are forwarded upstream; chunks that
//!    arrive with no open session are silently dropped
//! 4. **Downstream**: AI transcript fragments arrive as `textStream`, AI
//!    speech as `audioStream`, in upstream arrival order
//! 5. **Moderation**: a flagged candidate transcript terminates the
//!    interview with `terminateForViolation`
//! 6. **End**: `endInterview` closes the upstream session; the socket stays
//!    open and a new interview may be started

use crate::interview::messages::{ClientMessage, ServerMessage};
use crate::interview::moderation;
use crate::interview::registry::InterviewRegistry;
use crate::interview::session::{self, LiveConfig, LiveSession, UpstreamEvent};
use crate::state::AppState;

use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Log a running chunk count at this interval so a live stream doesn't flood
/// the logs.
const CHUNK_LOG_INTERVAL: u64 = 100;

/// What to do with one upstream event.
#[derive(Debug, PartialEq)]
enum EventAction {
    /// Forward a message to the client
    Send(ServerMessage),
    /// Moderation violation: send the message, then force-close everything
    Terminate(ServerMessage),
    /// Nothing client-visible
    Ignore,
}

/// Pure routing of upstream events to client messages. Moderation applies
/// only to candidate (input) transcription.
fn route_event(event: UpstreamEvent) -> EventAction {
    match event {
        UpstreamEvent::InputTranscript(text) => {
            if moderation::check(&text) {
                EventAction::Terminate(ServerMessage::TerminateForViolation {
                    reason: moderation::VIOLATION_REASON.to_string(),
                })
            } else {
                EventAction::Ignore
            }
        }
        UpstreamEvent::OutputTranscript(text) => {
            EventAction::Send(ServerMessage::TextStream { data: text })
        }
        UpstreamEvent::Audio { data, mime_type } => {
            EventAction::Send(ServerMessage::AudioStream { data, mime_type })
        }
        UpstreamEvent::TurnComplete => EventAction::Ignore,
        UpstreamEvent::UpstreamError(message) => EventAction::Send(ServerMessage::Error {
            message: format!("Upstream error: {}", message),
        }),
        UpstreamEvent::Closed => EventAction::Ignore,
    }
}

/// Actor for one interview connection.
pub struct InterviewWebSocket {
    /// Registry id, assigned when the actor starts
    connection_id: Option<Uuid>,

    /// Open upstream session, if any. At most one at a time.
    session: Option<LiveSession>,

    /// True while an upstream open is in flight, so a second Start during
    /// the open is rejected rather than racing
    opening: bool,

    /// Generation counter for Start attempts. Bumped on every Start and End,
    /// and stamped into the spawned open task, so a session opened for a
    /// Start that was since ended or superseded is discarded on arrival
    /// instead of activating against the wrong interview target
    start_seq: u64,

    /// Audio chunks received on this connection, for throttled logging
    audio_chunks: u64,

    registry: web::Data<InterviewRegistry>,
    state: web::Data<AppState>,
    last_heartbeat: Instant,
}

impl InterviewWebSocket {
    pub fn new(registry: web::Data<InterviewRegistry>, state: web::Data<AppState>) -> Self {
        Self {
            connection_id: None,
            session: None,
            opening: false,
            start_seq: 0,
            audio_chunks: 0,
            registry,
            state,
            last_heartbeat: Instant::now(),
        }
    }

    /// Mark a new Start attempt in flight and return its generation.
    fn begin_start(&mut self) -> u64 {
        self.start_seq += 1;
        self.opening = true;
        self.start_seq
    }

    /// Whether a spawned open task's result belongs to the latest Start.
    fn is_current_start(&self, seq: u64) -> bool {
        seq == self.start_seq
    }

    fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(json) => ctx.text(json),
            Err(e) => error!(error = %e, "Failed to serialize outbound message"),
        }
    }

    /// `startInterview`: open the upstream session off-actor, then report
    /// back through `SessionOpened`/`SessionFailed`.
    fn handle_start(&mut self, interview_target: String, ctx: &mut ws::WebsocketContext<Self>) {
        if self.opening || self.session.is_some() {
            self.send(
                ctx,
                &ServerMessage::error("Interview already in progress. Send endInterview first."),
            );
            return;
        }

        let config = self.state.get_config();
        let Some(api_key) = config.gemini.api_key else {
            warn!("startInterview rejected: GEMINI_API_KEY is not configured");
            self.send(
                ctx,
                &ServerMessage::error("GEMINI_API_KEY is not configured"),
            );
            return;
        };

        info!(target = %interview_target, "Starting interview");
        let seq = self.begin_start();

        let live_config = LiveConfig {
            api_key,
            model: config.gemini.live_model,
            interview_target: interview_target.clone(),
            silence_duration_ms: config.interview.silence_duration_ms as u64,
        };
        let addr = ctx.address();

        tokio::spawn(async move {
            match session::connect(live_config).await {
                Ok((session, events)) => addr.do_send(SessionOpened {
                    session,
                    events,
                    interview_target,
                    seq,
                }),
                Err(e) => addr.do_send(SessionFailed {
                    message: e.to_string(),
                    seq,
                }),
            }
        });
    }

    /// `realtimeInput`: forward if a session is open, otherwise drop.
    fn handle_audio(&mut self, data: String) {
        let Some(session) = &self.session else {
            // Chunks racing ahead of `connected` are expected; drop them
            return;
        };

        session.send_audio(data);
        self.audio_chunks += 1;
        if self.audio_chunks % CHUNK_LOG_INTERVAL == 0 {
            debug!(chunks = self.audio_chunks, "Audio chunks forwarded");
        }
    }

    /// `endInterview`: close the upstream session; idempotent. Bumping the
    /// generation invalidates any open still in flight.
    fn handle_end(&mut self) {
        self.start_seq += 1;
        self.opening = false;
        if let Some(session) = self.session.take() {
            session.close();
            if let Some(id) = self.connection_id {
                self.registry.deactivate(id);
            }
            self.state.decrement_active_interviews();
            info!("Interview ended");
        }
    }

    /// Moderation violation: terminate the interview and close the socket.
    fn terminate_for_violation(
        &mut self,
        message: &ServerMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        warn!("Terminating interview: moderation violation");
        self.send(ctx, message);
        self.handle_end();
        if let Some(id) = self.connection_id {
            self.registry.close(id);
        }
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Policy,
            description: Some(moderation::VIOLATION_REASON.to_string()),
        }));
        ctx.stop();
    }
}

/// Sent by the spawned open task when the upstream session is ready.
#[derive(Message)]
#[rtype(result = "()")]
struct SessionOpened {
    session: LiveSession,
    events: UnboundedReceiver<UpstreamEvent>,
    interview_target: String,
    seq: u64,
}

/// Sent by the spawned open task when the upstream open failed.
#[derive(Message)]
#[rtype(result = "()")]
struct SessionFailed {
    message: String,
    seq: u64,
}

impl Actor for InterviewWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        match self.registry.register() {
            Ok(id) => {
                info!(connection_id = %id, "Interview connection opened");
                self.connection_id = Some(id);
            }
            Err(e) => {
                warn!(error = %e, "Rejecting interview connection");
                self.send(ctx, &ServerMessage::error(e));
                ctx.stop();
                return;
            }
        }

        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                warn!("Interview client heartbeat timeout, closing connection");
                ctx.stop();
            } else {
                ctx.ping(b"");
            }
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // The socket is gone; force-close the upstream session if open
        if let Some(session) = self.session.take() {
            session.close();
            self.state.decrement_active_interviews();
        }
        if let Some(id) = self.connection_id {
            self.registry.close(id);
            self.registry.remove(id);
            info!(connection_id = %id, "Interview connection closed");
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for InterviewWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::StartInterview { interview_target }) => {
                    self.handle_start(interview_target, ctx);
                }
                Ok(ClientMessage::RealtimeInput { data }) => {
                    self.handle_audio(data);
                }
                Ok(ClientMessage::EndInterview) => {
                    self.handle_end();
                }
                Err(e) => {
                    // Malformed JSON doesn't affect the connection
                    warn!(error = %e, "Unparseable client message");
                    self.send(
                        ctx,
                        &ServerMessage::error(format!("Invalid message: {}", e)),
                    );
                }
            },
            Ok(ws::Message::Binary(_)) => {
                warn!("Unexpected binary frame; the interview protocol is JSON text");
            }
            Ok(ws::Message::Ping(data)) => {
                ctx.pong(&data);
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Interview socket closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                error!(error = %e, "Interview socket protocol error");
                ctx.stop();
            }
        }
    }
}

/// Upstream events, consumed as a stream so client-observed order matches
/// upstream arrival order.
impl StreamHandler<UpstreamEvent> for InterviewWebSocket {
    fn handle(&mut self, event: UpstreamEvent, ctx: &mut Self::Context) {
        if matches!(event, UpstreamEvent::Closed) {
            // Upstream went away on its own; clean up quietly
            info!("Gemini Live session closed by upstream");
            self.handle_end();
            return;
        }

        match route_event(event) {
            EventAction::Send(message) => self.send(ctx, &message),
            EventAction::Terminate(message) => self.terminate_for_violation(&message, ctx),
            EventAction::Ignore => {}
        }
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {
        // The event channel closing just means the session task ended; the
        // client socket stays open for a new Start
        debug!("Upstream event stream finished");
    }
}

impl Handler<SessionOpened> for InterviewWebSocket {
    type Result = ();

    fn handle(&mut self, msg: SessionOpened, ctx: &mut Self::Context) {
        // An end or a newer start superseded this open while it was in flight
        if !self.is_current_start(msg.seq) {
            debug!("Discarding upstream session from a superseded start");
            msg.session.close();
            return;
        }
        self.opening = false;

        // The client may have disconnected while the open was in flight
        let Some(id) = self.connection_id else {
            msg.session.close();
            return;
        };

        if let Err(e) = self.registry.activate(id, &msg.interview_target) {
            warn!(error = %e, "Discarding upstream session");
            msg.session.close();
            self.send(ctx, &ServerMessage::error(e));
            return;
        }

        self.session = Some(msg.session);
        self.audio_chunks = 0;
        self.state.increment_active_interviews();
        ctx.add_stream(UnboundedReceiverStream::new(msg.events));

        self.send(
            ctx,
            &ServerMessage::Connected {
                data: "AI Interviewer Ready".to_string(),
            },
        );
        info!(connection_id = %id, "Interview active");
    }
}

impl Handler<SessionFailed> for InterviewWebSocket {
    type Result = ();

    fn handle(&mut self, msg: SessionFailed, ctx: &mut Self::Context) {
        if !self.is_current_start(msg.seq) {
            debug!("Ignoring open failure from a superseded start");
            return;
        }
        self.opening = false;
        error!(error = %msg.message, "Failed to open Gemini Live session");
        self.send(ctx, &ServerMessage::error(msg.message));
    }
}

/// HTTP handler that upgrades `/interview` requests to WebSocket.
pub async fn interview_websocket(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    registry: web::Data<InterviewRegistry>,
) -> ActixResult<HttpResponse> {
    info!(
        peer = ?req.connection_info().peer_addr(),
        "New interview connection request"
    );
    ws::start(InterviewWebSocket::new(registry, state), &req, stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn test_socket() -> InterviewWebSocket {
        InterviewWebSocket::new(
            web::Data::new(InterviewRegistry::new(10)),
            web::Data::new(AppState::new(AppConfig::default())),
        )
    }

    #[test]
    fn test_end_invalidates_in_flight_start() {
        let mut socket = test_socket();
        let first = socket.begin_start();
        assert!(socket.is_current_start(first));

        // End while the open is still in flight
        socket.handle_end();
        assert!(!socket.opening);
        assert!(!socket.is_current_start(first));
    }

    #[test]
    fn test_new_start_supersedes_earlier_start() {
        let mut socket = test_socket();
        let first = socket.begin_start();
        socket.handle_end();
        let second = socket.begin_start();

        // Only the latest attempt may activate when its session arrives
        assert!(socket.is_current_start(second));
        assert!(!socket.is_current_start(first));
    }

    #[test]
    fn test_audio_without_session_is_dropped() {
        let mut socket = test_socket();
        socket.handle_audio("AAAA".to_string());
        assert_eq!(socket.audio_chunks, 0);
    }

    #[test]
    fn test_output_transcript_becomes_text_stream() {
        let action = route_event(UpstreamEvent::OutputTranscript("Tell me about".to_string()));
        assert_eq!(
            action,
            EventAction::Send(ServerMessage::TextStream {
                data: "Tell me about".to_string()
            })
        );
    }

    #[test]
    fn test_audio_event_becomes_audio_stream() {
        let action = route_event(UpstreamEvent::Audio {
            data: "AAAA".to_string(),
            mime_type: "audio/pcm;rate=24000".to_string(),
        });
        assert_eq!(
            action,
            EventAction::Send(ServerMessage::AudioStream {
                data: "AAAA".to_string(),
                mime_type: "audio/pcm;rate=24000".to_string()
            })
        );
    }

    #[test]
    fn test_clean_input_transcript_is_not_forwarded() {
        let action = route_event(UpstreamEvent::InputTranscript(
            "I completed my degree in 2023".to_string(),
        ));
        assert_eq!(action, EventAction::Ignore);
    }

    #[test]
    fn test_flagged_input_transcript_terminates() {
        let action = route_event(UpstreamEvent::InputTranscript(
            "I will pay you a bribe".to_string(),
        ));
        assert_eq!(
            action,
            EventAction::Terminate(ServerMessage::TerminateForViolation {
                reason: "Use of inappropriate language".to_string()
            })
        );
    }

    #[test]
    fn test_upstream_error_surfaces_without_terminating() {
        let action = route_event(UpstreamEvent::UpstreamError("connection reset".to_string()));
        match action {
            EventAction::Send(ServerMessage::Error { message }) => {
                assert!(message.contains("connection reset"));
            }
            other => panic!("Expected an error message, got {:?}", other),
        }
    }

    #[test]
    fn test_turn_complete_is_silent() {
        assert_eq!(route_event(UpstreamEvent::TurnComplete), EventAction::Ignore);
    }
}
