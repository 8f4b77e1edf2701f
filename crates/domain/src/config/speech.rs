use serde::{Deserialize, Serialize};

/// Tuning for the speech-session accumulator (VAD-gated utterance folding).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "d_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "d_min_speech_duration")]
    pub min_speech_duration_secs: f64,
    #[serde(default = "d_max_speech_duration")]
    pub max_speech_duration_secs: f64,
    #[serde(default = "d_inter_frame_gap")]
    pub inter_frame_gap_secs: f64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            sample_rate: d_sample_rate(),
            min_speech_duration_secs: d_min_speech_duration(),
            max_speech_duration_secs: d_max_speech_duration(),
            inter_frame_gap_secs: d_inter_frame_gap(),
        }
    }
}

fn d_sample_rate() -> u32 {
    16_000
}
fn d_min_speech_duration() -> f64 {
    0.5
}
fn d_max_speech_duration() -> f64 {
    30.0
}
fn d_inter_frame_gap() -> f64 {
    2.0
}
