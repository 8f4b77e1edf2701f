//! Session/connection manager (C9): the per-connection WebSocket handler,
//! its inbound dispatch table, and the deferred-turn bookkeeping for
//! screen-capture round trips.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

use scry_domain::audio::{AudioFrame, VadHint};
use scry_domain::trace::TraceEvent;
use scry_pipeline::{classify as classify_screen_trigger, PerformanceTimer};
use scry_protocol::{ClientMessage, RequestData, ServerMessage};

use crate::runtime::{self, TurnInput};
use crate::state::AppState;

fn now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

struct PendingTurn {
    original_text: String,
    original_timestamp: f64,
}

struct ConnectionState {
    session_id: String,
    screen_share_on: bool,
    voice_assistant_on: bool,
    pending_turn: Option<PendingTurn>,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4().to_string();
    TraceEvent::ConnectionOpened {
        session_id: session_id.clone(),
    }
    .emit();

    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(32);
    let closed = Arc::new(Notify::new());
    let send_failures = Arc::new(AtomicU32::new(0));

    let writer_closed = closed.clone();
    let writer_failures = send_failures.clone();
    let max_send_failures = state.config.session.max_consecutive_send_failures;
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sink.send(msg).await.is_err() {
                let failures = writer_failures.fetch_add(1, Ordering::SeqCst) + 1;
                if failures >= max_send_failures {
                    tracing::warn!("too many consecutive send failures, closing connection");
                    writer_closed.notify_one();
                    break;
                }
            } else {
                writer_failures.store(0, Ordering::SeqCst);
            }
        }
    });

    let conn = Arc::new(Mutex::new(ConnectionState {
        session_id: session_id.clone(),
        screen_share_on: false,
        voice_assistant_on: false,
        pending_turn: None,
    }));

    loop {
        tokio::select! {
            _ = closed.notified() => break,
            next = ws_stream.next() => {
                match next {
                    Some(Ok(Message::Text(text))) => {
                        handle_inbound(state.clone(), conn.clone(), tx.clone(), text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "websocket read error");
                        break;
                    }
                }
            }
        }
    }

    writer.abort();
    TraceEvent::ConnectionClosed {
        session_id,
        consecutive_send_failures: send_failures.load(Ordering::SeqCst),
    }
    .emit();
}

async fn send(tx: &mpsc::Sender<Message>, msg: &ServerMessage) {
    let Ok(json) = serde_json::to_string(msg) else {
        tracing::error!("failed to serialize outbound server message");
        return;
    };
    let _ = tx.send(Message::Text(json)).await;
}

async fn handle_inbound(
    state: AppState,
    conn: Arc<Mutex<ConnectionState>>,
    tx: mpsc::Sender<Message>,
    text: String,
) {
    let parsed: serde_json::Result<ClientMessage> = serde_json::from_str(&text);
    let msg = match parsed {
        Ok(msg) => msg,
        Err(e) => {
            send(
                &tx,
                &ServerMessage::Error {
                    message: format!("invalid message: {e}"),
                    timestamp: now(),
                },
            )
            .await;
            return;
        }
    };

    match msg {
        ClientMessage::ScreenShareStart => {
            conn.lock().screen_share_on = true;
            send(
                &tx,
                &ServerMessage::ScreenShareStarted {
                    message: "Screen sharing started".to_string(),
                    timestamp: now(),
                    screen_share_on: Some(true),
                },
            )
            .await;
        }
        ClientMessage::ScreenShareStop => {
            conn.lock().screen_share_on = false;
            send(
                &tx,
                &ServerMessage::ScreenShareStopped {
                    message: "Screen sharing stopped".to_string(),
                    timestamp: now(),
                    screen_share_on: Some(false),
                },
            )
            .await;
        }
        ClientMessage::VoiceAssistantStart => {
            conn.lock().voice_assistant_on = true;
            send(
                &tx,
                &ServerMessage::VoiceAssistantStarted {
                    message: "Voice assistant activated".to_string(),
                    timestamp: now(),
                    screen_share_on: None,
                },
            )
            .await;
        }
        ClientMessage::VoiceAssistantStop => {
            conn.lock().voice_assistant_on = false;
            send(
                &tx,
                &ServerMessage::VoiceAssistantStopped {
                    message: "Voice assistant deactivated".to_string(),
                    timestamp: now(),
                    screen_share_on: None,
                },
            )
            .await;
        }
        ClientMessage::AudioData {
            data,
            sample_rate,
            vad,
            timestamp,
            screen_image,
        } => {
            spawn_audio_frame(state, conn, tx, data, sample_rate, vad, timestamp, screen_image);
        }
        ClientMessage::VadState { vad, timestamp } => {
            spawn_audio_frame(state, conn, tx, Vec::new(), 16_000, vad, timestamp, None);
        }
        ClientMessage::ScreenCaptureResponse {
            screen_image,
            original_text,
            request_data,
        } => {
            spawn_screen_capture_response(state, conn, tx, screen_image, original_text, request_data);
        }
        ClientMessage::Heartbeat => {
            send(&tx, &ServerMessage::HeartbeatPong { timestamp: now() }).await;
        }
    }
}

/// Spawned so a slow STT/LLM/TTS chain on one utterance never blocks the
/// reader loop from answering a `heartbeat` arriving moments later.
fn spawn_audio_frame(
    state: AppState,
    conn: Arc<Mutex<ConnectionState>>,
    tx: mpsc::Sender<Message>,
    samples: Vec<f32>,
    sample_rate: u32,
    vad: VadHint,
    timestamp: f64,
    screen_image: Option<String>,
) {
    tokio::spawn(async move {
        let session_id = conn.lock().session_id.clone();
        let frame = AudioFrame {
            samples,
            sample_rate,
            vad,
            timestamp,
        };
        let Some(chunk) = state.speech.push(&session_id, frame) else {
            if vad.is_speaking {
                send(
                    &tx,
                    &ServerMessage::SpeechActive {
                        message: "Speech detected, accumulating audio...".to_string(),
                        timestamp: now(),
                        vad,
                    },
                )
                .await;
            }
            return;
        };

        let timer = PerformanceTimer::start();
        let transcription = state.stt.transcribe(&chunk.data, chunk.sample_rate).await;
        let elapsed = timer.elapsed_secs();
        let transcription = match transcription {
            Ok(t) => {
                state
                    .performance
                    .record("stt", "transcribe", elapsed, true, serde_json::Value::Null);
                t
            }
            Err(e) => {
                state
                    .performance
                    .record("stt", "transcribe", elapsed, false, serde_json::Value::Null);
                send(
                    &tx,
                    &ServerMessage::Error {
                        message: format!("speech recognition failed: {e}"),
                        timestamp: now(),
                    },
                )
                .await;
                return;
            }
        };

        if transcription.text.trim().is_empty() {
            return;
        }

        TraceEvent::TranscriptionCompleted {
            session_id: session_id.clone(),
            text_chars: transcription.text.chars().count(),
            duration_secs: elapsed,
        }
        .emit();

        send(
            &tx,
            &ServerMessage::TranscriptionResult {
                text: transcription.text.clone(),
                timestamp: chunk.timestamp,
                processing_time: elapsed,
                confidence: transcription.confidence.unwrap_or(0.0),
            },
        )
        .await;

        let screen_share_on = conn.lock().screen_share_on;
        let trigger = classify_screen_trigger(&transcription.text);
        if screen_share_on && trigger.fires() && screen_image.is_none() {
            TraceEvent::ScreenTriggerDetected {
                confidence: trigger.confidence,
                matched: trigger.reason.to_string(),
            }
            .emit();
            conn.lock().pending_turn = Some(PendingTurn {
                original_text: transcription.text.clone(),
                original_timestamp: chunk.timestamp,
            });
            send(
                &tx,
                &ServerMessage::ScreenCaptureRequest {
                    confidence: trigger.confidence,
                    reason: trigger.reason.to_string(),
                    trigger_matches: trigger.trigger_matches,
                    context_matches: trigger.context_matches,
                    timestamp: now(),
                    original_text: transcription.text,
                    original_timestamp: chunk.timestamp,
                },
            )
            .await;
            return;
        }

        run_turn_and_reply(
            &state,
            &session_id,
            &tx,
            transcription.text,
            screen_image,
        )
        .await;
    });
}

fn spawn_screen_capture_response(
    state: AppState,
    conn: Arc<Mutex<ConnectionState>>,
    tx: mpsc::Sender<Message>,
    screen_image: String,
    original_text: String,
    request_data: RequestData,
) {
    tokio::spawn(async move {
        let session_id = conn.lock().session_id.clone();
        let pending = conn.lock().pending_turn.take();
        let text = match pending {
            Some(p) => p.original_text,
            None => original_text,
        };
        let _ = request_data.original_timestamp;
        run_turn_and_reply(&state, &session_id, &tx, text, Some(screen_image)).await;
    });
}

async fn run_turn_and_reply(
    state: &AppState,
    session_id: &str,
    tx: &mpsc::Sender<Message>,
    text: String,
    screen_image: Option<String>,
) {
    let timer = PerformanceTimer::start();
    let output = runtime::run_turn(
        state,
        TurnInput {
            session_id: session_id.to_string(),
            user_text: text,
            screen_image_base64: screen_image,
            tool_calling_enabled: true,
        },
    )
    .await;
    let elapsed = timer.elapsed_secs();
    state
        .performance
        .record("total_pipeline", "run_turn", elapsed, true, serde_json::Value::Null);

    send(
        tx,
        &ServerMessage::AiResponse {
            text: output.text.clone(),
            timestamp: now(),
            processing_time: elapsed,
            session_id: session_id.to_string(),
            screen_context: output.screen_context,
        },
    )
    .await;

    let tts_timer = PerformanceTimer::start();
    match state.tts.synthesize(&output.text).await {
        Ok(audio) => {
            state.performance.record(
                "tts",
                "synthesize",
                tts_timer.elapsed_secs(),
                true,
                serde_json::Value::Null,
            );
            send(
                tx,
                &ServerMessage::AudioResponse {
                    audio_data: audio.samples,
                    sample_rate: audio.sample_rate,
                    duration: audio.duration_secs,
                    processing_time: tts_timer.elapsed_secs(),
                    text: output.text,
                    timestamp: now(),
                    session_id: session_id.to_string(),
                },
            )
            .await;
        }
        Err(e) => {
            state.performance.record(
                "tts",
                "synthesize",
                tts_timer.elapsed_secs(),
                false,
                serde_json::Value::Null,
            );
            send(
                tx,
                &ServerMessage::Error {
                    message: format!("speech synthesis failed: {e}"),
                    timestamp: now(),
                },
            )
            .await;
        }
    }
}
