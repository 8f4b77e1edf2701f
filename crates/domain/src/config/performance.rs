use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-service advisory thresholds (seconds) and rolling-window sizing for
/// the performance monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "d_thresholds")]
    pub thresholds_secs: HashMap<String, f64>,
    #[serde(default = "d_window")]
    pub rolling_window: usize,
    #[serde(default = "d_history")]
    pub max_history: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            thresholds_secs: d_thresholds(),
            rolling_window: d_window(),
            max_history: d_history(),
        }
    }
}

fn d_thresholds() -> HashMap<String, f64> {
    let mut m = HashMap::new();
    m.insert("stt".to_string(), 60.0);
    m.insert("multimodal".to_string(), 20.0);
    m.insert("tts".to_string(), 40.0);
    m.insert("total_pipeline".to_string(), 60.0);
    m
}

fn d_window() -> usize {
    100
}

fn d_history() -> usize {
    1000
}
