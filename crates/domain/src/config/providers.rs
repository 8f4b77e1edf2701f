use serde::{Deserialize, Serialize};

/// Endpoints for the external speech/vision collaborators this gateway
/// drives over HTTP. The services themselves are out of scope; this is
/// just where to find them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "d_stt_endpoint")]
    pub stt_endpoint: String,
    #[serde(default = "d_tts_endpoint")]
    pub tts_endpoint: String,
    #[serde(default = "d_multimodal_endpoint")]
    pub multimodal_endpoint: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            stt_endpoint: d_stt_endpoint(),
            tts_endpoint: d_tts_endpoint(),
            multimodal_endpoint: d_multimodal_endpoint(),
        }
    }
}

fn d_stt_endpoint() -> String {
    "http://127.0.0.1:8001/transcribe".into()
}
fn d_tts_endpoint() -> String {
    "http://127.0.0.1:8002/synthesize".into()
}
fn d_multimodal_endpoint() -> String {
    "http://127.0.0.1:8003/generate".into()
}
