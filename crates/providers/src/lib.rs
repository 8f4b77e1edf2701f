//! `scry-providers` — interfaces (and thin HTTP adapters) for the external
//! collaborators this gateway drives: speech recognition, speech
//! synthesis, the multimodal reasoning model, and screen-image decoding.

pub mod http;
pub mod image_codec;
pub mod traits;

pub use image_codec::ImageCodec;
pub use traits::{
    DecodedImage, MultimodalLlmProvider, MultimodalMessage, MultimodalRequest, MultimodalResponse,
    SttProvider, SynthesizedAudio, TranscriptionResult, TtsProvider,
};
