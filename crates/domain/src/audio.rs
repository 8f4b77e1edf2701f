use serde::{Deserialize, Serialize};

/// Voice-activity-detection hint accompanying each audio frame, or sent
/// standalone as a `vad_state` message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VadHint {
    #[serde(rename = "isSpeaking")]
    pub is_speaking: bool,
    #[serde(default)]
    pub energy: Option<f32>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// One inbound audio frame as pushed into the speech-session accumulator
/// (C3): decoded float32 mono samples plus the VAD hint for this frame.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub vad: VadHint,
    pub timestamp: f64,
}

/// Immutable utterance emitted by C3 once a speech session completes,
/// consumed exactly once by the STT collaborator.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub data: Vec<f32>,
    pub sample_rate: u32,
    pub timestamp: f64,
    pub chunk_id: String,
}
