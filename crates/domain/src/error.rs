/// Shared error type used across all gateway crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport not connected")]
    NotConnected,

    #[error("transport broken: {0}")]
    TransportBroken(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("external service {service}: {message}")]
    ExternalService { service: String, message: String },

    #[error("tool workflow timed out after {0:?}")]
    WorkflowTimeout(std::time::Duration),

    #[error("tool quality {quality_score} below threshold {threshold}")]
    QualityBelowThreshold { quality_score: f32, threshold: f32 },

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
