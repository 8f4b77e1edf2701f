mod performance;
mod providers;
mod screen;
mod server;
mod session;
mod speech;
mod tool_server;
mod workflow;

pub use performance::PerformanceConfig;
pub use providers::ProvidersConfig;
pub use screen::ScreenConfig;
pub use server::{CorsConfig, ServerConfig};
pub use session::SessionConfig;
pub use speech::SpeechConfig;
pub use tool_server::ToolServerConfig;
pub use workflow::WorkflowConfig;

use serde::{Deserialize, Serialize};

/// Top-level gateway configuration, assembled from the per-concern structs
/// in this module. Each sub-config can be loaded and overridden independently
/// when only a slice of it is present in a config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub tool_server: ToolServerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_expected_constants() {
        let cfg = GatewayConfig {
            tool_server: ToolServerConfig::default(),
            ..Default::default()
        };
        assert_eq!(cfg.speech.sample_rate, 16_000);
        assert_eq!(cfg.performance.max_history, 1000);
        assert_eq!(cfg.workflow.max_retries, 2);
        assert_eq!(cfg.screen.max_image_size, 1024);
        assert_eq!(cfg.session.conversation_memory_cap, 50);
        assert_eq!(cfg.server.port, 8787);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert!(cfg.server.cors.allowed_origins.contains(&"http://localhost:*".to_string()));
        assert_eq!(cfg.providers.stt_endpoint, "http://127.0.0.1:8001/transcribe");
        assert_eq!(cfg.providers.tts_endpoint, "http://127.0.0.1:8002/synthesize");
        assert_eq!(cfg.providers.multimodal_endpoint, "http://127.0.0.1:8003/generate");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let toml_src = r#"
            [tool_server]
            command = "my-tool-server"
        "#;
        let cfg: GatewayConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(cfg.tool_server.command, "my-tool-server");
        assert_eq!(cfg.speech.max_speech_duration_secs, 30.0);
        assert_eq!(cfg.performance.thresholds_secs["multimodal"], 20.0);
    }
}
