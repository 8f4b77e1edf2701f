use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

/// One turn half (user utterance or assistant reply) in a session's
/// rolling conversation memory. `had_screen`/`tool_used`/`quality_score`
/// are only ever set on assistant entries, attached by the orchestrator
/// when that turn analyzed a screen image or used the tool-calling
/// workflow; they are not required to survive a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: ConversationRole,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub had_screen: Option<bool>,
    #[serde(default)]
    pub tool_used: Option<bool>,
    #[serde(default)]
    pub quality_score: Option<f32>,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::User,
            content: content.into(),
            timestamp: chrono::Utc::now(),
            had_screen: None,
            tool_used: None,
            quality_score: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::Assistant,
            content: content.into(),
            timestamp: chrono::Utc::now(),
            had_screen: None,
            tool_used: None,
            quality_score: None,
        }
    }

    pub fn with_screen_flag(mut self, had_screen: bool) -> Self {
        self.had_screen = Some(had_screen);
        self
    }

    pub fn with_tool_usage(mut self, tool_used: bool, quality_score: Option<f32>) -> Self {
        self.tool_used = Some(tool_used);
        self.quality_score = quality_score;
        self
    }
}
