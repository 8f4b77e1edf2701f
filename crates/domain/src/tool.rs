use serde::{Deserialize, Serialize};

/// Provider-agnostic tool call, as surfaced by C6's `select_tool` step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

/// Tool definition as discovered from the external tool server and
/// presented to the intent classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

/// Outcome of executing a single tool call, already text-extracted and
/// cleaned (citation markers stripped, bold markers stripped).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallOutcome {
    pub call_id: String,
    pub tool_name: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolCallOutcome {
    pub fn ok(call_id: impl Into<String>, tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn err(call_id: impl Into<String>, tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: message.into(),
            is_error: true,
        }
    }
}
