//! Interfaces for the external collaborators this gateway drives but does
//! not implement: the speech-recognition engine, the text-to-speech
//! engine, and the multimodal LLM. Concrete adapters live alongside these
//! traits; the engines themselves are someone else's service.

use scry_domain::error::Result;

/// Result of transcribing one completed [`scry_domain::audio::AudioChunk`].
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    pub text: String,
    pub confidence: Option<f32>,
}

#[async_trait::async_trait]
pub trait SttProvider: Send + Sync {
    async fn transcribe(
        &self,
        data: &[f32],
        sample_rate: u32,
    ) -> Result<TranscriptionResult>;
}

/// Synthesized speech audio, ready to be sent back as an `audio_response`.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub duration_secs: f64,
}

#[async_trait::async_trait]
pub trait TtsProvider: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio>;
}

/// A single message in the multimodal conversation sent to the reasoning
/// model, mirroring the shape C7 assembles from conversation memory.
#[derive(Debug, Clone)]
pub struct MultimodalMessage {
    pub role: String,
    pub content: String,
}

/// A decoded, already-resized screen image ready to attach to a request.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct MultimodalRequest {
    pub system_prompt: String,
    pub messages: Vec<MultimodalMessage>,
    pub image: Option<DecodedImage>,
    /// Tool definitions available for this turn (empty for the direct,
    /// no-tool-calling path).
    pub tools: Vec<scry_domain::tool::ToolDefinition>,
}

#[derive(Debug, Clone)]
pub struct MultimodalResponse {
    pub text: String,
    pub tool_calls: Vec<scry_domain::tool::ToolCall>,
}

#[async_trait::async_trait]
pub trait MultimodalLlmProvider: Send + Sync {
    async fn generate(&self, req: MultimodalRequest) -> Result<MultimodalResponse>;
}
