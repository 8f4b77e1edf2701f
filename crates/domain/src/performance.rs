use serde::{Deserialize, Serialize};

/// One timed operation recorded by the performance monitor (C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub service: String,
    pub operation: String,
    pub duration_secs: f64,
    pub success: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Rolling aggregate for one service, derived from its last-N successful
/// samples.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ServiceStats {
    pub count: usize,
    pub min_secs: f64,
    pub max_secs: f64,
    pub avg_secs: f64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHealth {
    Good,
    Fair,
    Poor,
    Unknown,
}
