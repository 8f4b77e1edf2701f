use serde::{Deserialize, Serialize};

/// Launch parameters for the external tool server child process that the
/// framed-RPC client connects to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: std::collections::HashMap<String, String>,
    #[serde(default = "d_startup_timeout")]
    pub startup_timeout_secs: u64,
    #[serde(default = "d_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            command: "mcp-server".to_string(),
            args: Vec::new(),
            env: std::collections::HashMap::new(),
            startup_timeout_secs: d_startup_timeout(),
            shutdown_grace_secs: d_shutdown_grace(),
        }
    }
}

fn d_startup_timeout() -> u64 {
    10
}
fn d_shutdown_grace() -> u64 {
    5
}
