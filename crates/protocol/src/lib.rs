//! Wire protocol for the client-facing duplex WebSocket connection.
//!
//! `ClientMessage` covers everything a connected client may send; `ServerMessage`
//! covers everything the gateway may emit back on the same socket.

use serde::{Deserialize, Serialize};

use scry_domain::audio::VadHint;

fn d_sample_rate() -> u32 {
    16_000
}

/// Nested `request_data` payload carried on `screen_capture_response`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestData {
    pub original_timestamp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "screen_share_start")]
    ScreenShareStart,
    #[serde(rename = "screen_share_stop")]
    ScreenShareStop,
    #[serde(rename = "voice_assistant_start")]
    VoiceAssistantStart,
    #[serde(rename = "voice_assistant_stop")]
    VoiceAssistantStop,
    #[serde(rename = "audio_data")]
    AudioData {
        /// Mono float32 PCM samples as a JSON array of numbers.
        data: Vec<f32>,
        #[serde(default = "d_sample_rate")]
        sample_rate: u32,
        vad: VadHint,
        timestamp: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        screen_image: Option<String>,
    },
    #[serde(rename = "vad_state")]
    VadState { vad: VadHint, timestamp: f64 },
    #[serde(rename = "screen_capture_response")]
    ScreenCaptureResponse {
        screen_image: String,
        original_text: String,
        request_data: RequestData,
    },
    #[serde(rename = "heartbeat")]
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "screen_share_started")]
    ScreenShareStarted {
        message: String,
        timestamp: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        screen_share_on: Option<bool>,
    },
    #[serde(rename = "screen_share_stopped")]
    ScreenShareStopped {
        message: String,
        timestamp: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        screen_share_on: Option<bool>,
    },
    #[serde(rename = "voice_assistant_started")]
    VoiceAssistantStarted {
        message: String,
        timestamp: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        screen_share_on: Option<bool>,
    },
    #[serde(rename = "voice_assistant_stopped")]
    VoiceAssistantStopped {
        message: String,
        timestamp: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        screen_share_on: Option<bool>,
    },
    #[serde(rename = "transcription_result")]
    TranscriptionResult {
        text: String,
        timestamp: f64,
        processing_time: f64,
        confidence: f32,
    },
    #[serde(rename = "speech_active")]
    SpeechActive {
        message: String,
        timestamp: f64,
        vad: VadHint,
    },
    #[serde(rename = "screen_capture_request")]
    ScreenCaptureRequest {
        confidence: f32,
        reason: String,
        trigger_matches: Vec<String>,
        context_matches: Vec<String>,
        timestamp: f64,
        original_text: String,
        original_timestamp: f64,
    },
    #[serde(rename = "ai_response")]
    AiResponse {
        text: String,
        timestamp: f64,
        processing_time: f64,
        session_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        screen_context: Option<String>,
    },
    #[serde(rename = "audio_response")]
    AudioResponse {
        audio_data: Vec<f32>,
        sample_rate: u32,
        duration: f64,
        processing_time: f64,
        text: String,
        timestamp: f64,
        session_id: String,
    },
    #[serde(rename = "heartbeat_pong")]
    HeartbeatPong { timestamp: f64 },
    #[serde(rename = "error")]
    Error { message: String, timestamp: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_data_round_trips_with_default_sample_rate() {
        let json = serde_json::json!({
            "type": "audio_data",
            "data": [0.0, 0.1, 0.2],
            "vad": { "isSpeaking": true },
            "timestamp": 1.0
        });
        let msg: ClientMessage = serde_json::from_value(json).unwrap();
        match msg {
            ClientMessage::AudioData { sample_rate, screen_image, vad, .. } => {
                assert_eq!(sample_rate, 16_000);
                assert!(screen_image.is_none());
                assert!(vad.is_speaking);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn screen_capture_response_parses_nested_request_data() {
        let json = serde_json::json!({
            "type": "screen_capture_response",
            "screen_image": "base64==",
            "original_text": "what do you see",
            "request_data": { "original_timestamp": 42.5 }
        });
        let msg: ClientMessage = serde_json::from_value(json).unwrap();
        match msg {
            ClientMessage::ScreenCaptureResponse { request_data, .. } => {
                assert_eq!(request_data.original_timestamp, 42.5);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn error_message_serializes_with_type_tag() {
        let msg = ServerMessage::Error {
            message: "bad json".into(),
            timestamp: 1.0,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "bad json");
    }

    #[test]
    fn heartbeat_and_unit_variants_deserialize() {
        let msg: ClientMessage = serde_json::from_value(serde_json::json!({"type": "heartbeat"})).unwrap();
        assert!(matches!(msg, ClientMessage::Heartbeat));
        let msg: ClientMessage =
            serde_json::from_value(serde_json::json!({"type": "screen_share_start"})).unwrap();
        assert!(matches!(msg, ClientMessage::ScreenShareStart));
    }
}
