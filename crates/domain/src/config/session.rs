use serde::{Deserialize, Serialize};

/// Per-connection bookkeeping: disconnect threshold and conversation memory cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "d_max_send_failures")]
    pub max_consecutive_send_failures: u32,
    #[serde(default = "d_memory_cap")]
    pub conversation_memory_cap: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_consecutive_send_failures: d_max_send_failures(),
            conversation_memory_cap: d_memory_cap(),
        }
    }
}

fn d_max_send_failures() -> u32 {
    3
}
fn d_memory_cap() -> usize {
    50
}
