//! Shared application state, handed to every connection handler behind an
//! `Arc` so external calls and background bookkeeping never compete for a
//! single lock across unrelated sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use scry_domain::config::GatewayConfig;
use scry_pipeline::{ConversationMemory, PerformanceMonitor, SpeechAccumulator};
use scry_providers::{MultimodalLlmProvider, SttProvider, TtsProvider};
use scry_toolclient::{ToolClient, ToolHandle};

/// Cached screen analysis text, keyed by `(payload length, time bucket)` per
/// the design notes: a cheap approximation that avoids re-analyzing
/// rapidly-repeated identical captures without hashing image bytes.
struct CachedAnalysis {
    text: String,
    inserted_at: Instant,
}

pub struct ScreenAnalysisCache {
    ttl_secs: u64,
    entries: Mutex<HashMap<(usize, i64), CachedAnalysis>>,
}

impl ScreenAnalysisCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn key(&self, payload_len: usize, analysis_interval_secs: i64) -> (usize, i64) {
        let bucket = chrono::Utc::now().timestamp() / analysis_interval_secs.max(1);
        (payload_len, bucket)
    }

    pub fn get(&self, payload_len: usize, analysis_interval_secs: i64) -> Option<String> {
        let key = self.key(payload_len, analysis_interval_secs);
        let entries = self.entries.lock();
        let cached = entries.get(&key)?;
        if cached.inserted_at.elapsed().as_secs() > self.ttl_secs {
            return None;
        }
        Some(cached.text.clone())
    }

    pub fn put(&self, payload_len: usize, analysis_interval_secs: i64, text: String) {
        let key = self.key(payload_len, analysis_interval_secs);
        self.entries.lock().insert(
            key,
            CachedAnalysis {
                text,
                inserted_at: Instant::now(),
            },
        );
    }
}

/// Per-process collaborators wired up at startup and shared by every
/// connection for the lifetime of the server.
#[derive(Clone)]
pub struct AppState {
    // -- configuration --
    pub config: Arc<GatewayConfig>,

    // -- in-process pipeline stages (C3-C5, C8 lives in scry_pipeline too) --
    pub speech: Arc<SpeechAccumulator>,
    pub performance: Arc<PerformanceMonitor>,
    pub memory: Arc<ConversationMemory>,

    // -- tool-calling collaborators (C1/C2) --
    pub tool_client: Arc<ToolClient>,
    pub tool_handle: Arc<ToolHandle>,

    // -- external service collaborators --
    pub stt: Arc<dyn SttProvider>,
    pub tts: Arc<dyn TtsProvider>,
    pub llm: Arc<dyn MultimodalLlmProvider>,

    // -- screen-analysis cache (C7 support) --
    pub screen_cache: Arc<ScreenAnalysisCache>,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        stt: Arc<dyn SttProvider>,
        tts: Arc<dyn TtsProvider>,
        llm: Arc<dyn MultimodalLlmProvider>,
    ) -> Self {
        let tool_client = Arc::new(ToolClient::new(config.tool_server.clone()));
        let tool_handle = Arc::new(ToolHandle::new(tool_client.clone()));
        let screen_cache = Arc::new(ScreenAnalysisCache::new(config.screen.analysis_cache_ttl_secs));
        Self {
            speech: Arc::new(SpeechAccumulator::new(config.speech.clone())),
            performance: Arc::new(PerformanceMonitor::new(config.performance.clone())),
            memory: Arc::new(ConversationMemory::new(config.session.conversation_memory_cap)),
            tool_client,
            tool_handle,
            stt,
            tts,
            llm,
            screen_cache,
            config: Arc::new(config),
        }
    }
}
