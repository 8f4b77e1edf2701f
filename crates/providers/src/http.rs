//! Minimal HTTP adapters for the external collaborators. These call a
//! configurable REST endpoint and translate its response into our
//! provider-agnostic types; the speech/vision models behind the endpoint
//! are out of scope here.

use serde::{Deserialize, Serialize};

use scry_domain::error::{Error, Result};

use crate::traits::{
    MultimodalLlmProvider, MultimodalRequest, MultimodalResponse, SttProvider, SynthesizedAudio,
    TranscriptionResult, TtsProvider,
};

fn from_reqwest(service: &str, e: reqwest::Error) -> Error {
    Error::ExternalService {
        service: service.to_string(),
        message: e.to_string(),
    }
}

pub struct HttpSttProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSttProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("reqwest client builds"),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct SttRequestBody<'a> {
    samples: &'a [f32],
    sample_rate: u32,
}

#[derive(Deserialize)]
struct SttResponseBody {
    text: String,
    confidence: Option<f32>,
}

#[async_trait::async_trait]
impl SttProvider for HttpSttProvider {
    async fn transcribe(&self, data: &[f32], sample_rate: u32) -> Result<TranscriptionResult> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&SttRequestBody {
                samples: data,
                sample_rate,
            })
            .send()
            .await
            .map_err(|e| from_reqwest("stt", e))?
            .error_for_status()
            .map_err(|e| from_reqwest("stt", e))?
            .json::<SttResponseBody>()
            .await
            .map_err(|e| from_reqwest("stt", e))?;

        Ok(TranscriptionResult {
            text: resp.text,
            confidence: resp.confidence,
        })
    }
}

pub struct HttpTtsProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTtsProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(40))
                .build()
                .expect("reqwest client builds"),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct TtsRequestBody<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct TtsResponseBody {
    samples: Vec<f32>,
    sample_rate: u32,
}

#[async_trait::async_trait]
impl TtsProvider for HttpTtsProvider {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&TtsRequestBody { text })
            .send()
            .await
            .map_err(|e| from_reqwest("tts", e))?
            .error_for_status()
            .map_err(|e| from_reqwest("tts", e))?
            .json::<TtsResponseBody>()
            .await
            .map_err(|e| from_reqwest("tts", e))?;

        let duration_secs = resp.samples.len() as f64 / resp.sample_rate.max(1) as f64;
        Ok(SynthesizedAudio {
            samples: resp.samples,
            sample_rate: resp.sample_rate,
            duration_secs,
        })
    }
}

pub struct HttpMultimodalProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMultimodalProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .expect("reqwest client builds"),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct MultimodalRequestBody {
    system_prompt: String,
    messages: Vec<MultimodalMessageBody>,
    image_rgb_base64: Option<String>,
}

#[derive(Serialize)]
struct MultimodalMessageBody {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MultimodalResponseBody {
    text: String,
}

#[async_trait::async_trait]
impl MultimodalLlmProvider for HttpMultimodalProvider {
    async fn generate(&self, req: MultimodalRequest) -> Result<MultimodalResponse> {
        use base64::Engine;

        let image_rgb_base64 = req
            .image
            .as_ref()
            .map(|img| base64::engine::general_purpose::STANDARD.encode(&img.rgb));

        let body = MultimodalRequestBody {
            system_prompt: req.system_prompt,
            messages: req
                .messages
                .into_iter()
                .map(|m| MultimodalMessageBody {
                    role: m.role,
                    content: m.content,
                })
                .collect(),
            image_rgb_base64,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| from_reqwest("multimodal", e))?
            .error_for_status()
            .map_err(|e| from_reqwest("multimodal", e))?
            .json::<MultimodalResponseBody>()
            .await
            .map_err(|e| from_reqwest("multimodal", e))?;

        Ok(MultimodalResponse {
            text: resp.text,
            tool_calls: Vec::new(),
        })
    }
}
