use serde::{Deserialize, Serialize};

/// Screen-image handling: downscale target and analysis cache lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    #[serde(default = "d_max_image_size")]
    pub max_image_size: u32,
    #[serde(default = "d_analysis_cache_ttl")]
    pub analysis_cache_ttl_secs: u64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            max_image_size: d_max_image_size(),
            analysis_cache_ttl_secs: d_analysis_cache_ttl(),
        }
    }
}

fn d_max_image_size() -> u32 {
    1024
}
fn d_analysis_cache_ttl() -> u64 {
    30
}
