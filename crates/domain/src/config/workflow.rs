use serde::{Deserialize, Serialize};

/// Tool-calling workflow tuning (C6): retries, quality gate, overall timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
    #[serde(default = "d_quality_threshold")]
    pub quality_score_threshold: f32,
    #[serde(default = "d_timeout")]
    pub timeout_secs: u64,
    /// Re-enter `optimize_parameters` on retry (true) vs re-issue
    /// `execute_tool` with the previously optimized parameters (false).
    /// See the "retry count scope in C6" open question in the design notes.
    #[serde(default = "d_reoptimize")]
    pub reoptimize_on_retry: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_retries: d_max_retries(),
            quality_score_threshold: d_quality_threshold(),
            timeout_secs: d_timeout(),
            reoptimize_on_retry: d_reoptimize(),
        }
    }
}

fn d_max_retries() -> u32 {
    2
}
fn d_quality_threshold() -> f32 {
    0.6
}
fn d_timeout() -> u64 {
    45
}
fn d_reoptimize() -> bool {
    true
}
