mod runtime;
mod session;
mod state;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use scry_domain::config::{CorsConfig, GatewayConfig};
use scry_providers::http::{HttpMultimodalProvider, HttpSttProvider, HttpTtsProvider};

use crate::state::AppState;

fn load_config() -> GatewayConfig {
    let path = std::env::var("GATEWAY_CONFIG_PATH").unwrap_or_else(|_| "gateway.toml".to_string());
    match std::fs::read_to_string(&path) {
        Ok(raw) => match toml::from_str(&raw) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "failed to parse gateway config, using defaults");
                GatewayConfig {
                    tool_server: Default::default(),
                    ..Default::default()
                }
            }
        },
        Err(_) => {
            tracing::info!(path = %path, "no config file found, using defaults");
            GatewayConfig {
                tool_server: Default::default(),
                ..Default::default()
            }
        }
    }
}

/// Partitions configured origins into exact matches and `:*` wildcard-port
/// prefixes, mirroring how operators express "any port on this host".
fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\" — all origins allowed");
        return CorsLayer::new().allow_origin(AllowOrigin::any());
    }

    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();

    for origin in &cors.allowed_origins {
        if origin.ends_with(":*") {
            let prefix = origin.trim_end_matches('*').to_owned();
            wildcard_prefixes.push(prefix);
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            wildcard_prefixes.iter().any(|prefix| {
                origin_str
                    .strip_prefix(prefix.as_str())
                    .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
        })
    };

    CorsLayer::new().allow_origin(allow_origin)
}

fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .route("/ws", get(session::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = load_config();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let stt: Arc<dyn scry_providers::SttProvider> =
        Arc::new(HttpSttProvider::new(config.providers.stt_endpoint.clone()));
    let tts: Arc<dyn scry_providers::TtsProvider> =
        Arc::new(HttpTtsProvider::new(config.providers.tts_endpoint.clone()));
    let llm: Arc<dyn scry_providers::MultimodalLlmProvider> = Arc::new(HttpMultimodalProvider::new(
        config.providers.multimodal_endpoint.clone(),
    ));

    let state = AppState::new(config, stt, tts, llm);

    if let Err(e) = state.tool_client.connect().await {
        tracing::warn!(error = %e, "tool server not available at startup; tool-calling will be unavailable until it reconnects");
    }

    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "scry-gateway listening");
    axum::serve(listener, app).await?;

    state.tool_client.close().await;
    Ok(())
}
