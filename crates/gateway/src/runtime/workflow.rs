//! Tool-calling workflow (C6): a small explicit state machine, each node a
//! single LLM call, with a bounded retry cycle around `execute_tool` and a
//! wall-clock ceiling around the whole thing.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use scry_domain::config::WorkflowConfig;
use scry_domain::error::{Error, Result};
use scry_providers::traits::{MultimodalLlmProvider, MultimodalMessage, MultimodalRequest};
use scry_toolclient::ToolHandle;

/// Everything the workflow threads between nodes.
pub struct ToolCallState {
    pub user_query: String,
    pub conversation_context: String,
    pub screen_context: String,
    pub session_id: String,
    pub available_tools: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct IntentClassification {
    #[serde(default)]
    needs_tool: bool,
    #[serde(default)]
    confidence: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct ToolSelection {
    selected_tool: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OptimizedParameters {
    rewritten_query: String,
    system_prompt: String,
    search_parameters: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct ParsedResponse {
    body: String,
    #[serde(default)]
    citations: String,
    quality_score: f32,
    #[serde(default)]
    issues: Vec<String>,
}

/// The workflow's final, gate-checked output. C7 only uses `final_text` when
/// `needs_tool && execution_success && quality_score >= 0.6`.
pub struct WorkflowOutcome {
    pub needs_tool: bool,
    pub execution_success: bool,
    pub quality_score: f32,
    pub final_text: String,
    pub tool_name: Option<String>,
    pub attempts: u32,
}

impl WorkflowOutcome {
    /// Usable by C7 iff a tool was actually needed, it ran successfully, and
    /// its parsed quality score clears the configured gate.
    pub fn usable(&self, quality_score_threshold: f32) -> bool {
        self.needs_tool && self.execution_success && self.quality_score >= quality_score_threshold
    }
}

/// Ask the LLM for a one-shot text completion and parse its response as
/// JSON. Tolerates a response wrapped in prose by taking the first
/// `{...}` span.
async fn ask_json<T: for<'de> Deserialize<'de>>(
    llm: &dyn MultimodalLlmProvider,
    system_prompt: &str,
    user_message: &str,
) -> Result<T> {
    let resp = llm
        .generate(MultimodalRequest {
            system_prompt: system_prompt.to_string(),
            messages: vec![MultimodalMessage {
                role: "user".to_string(),
                content: user_message.to_string(),
            }],
            image: None,
            tools: Vec::new(),
        })
        .await?;
    let span = extract_json_span(&resp.text)
        .ok_or_else(|| Error::Decode("LLM response did not contain a JSON object".to_string()))?;
    serde_json::from_str(span).map_err(|e| Error::Decode(e.to_string()))
}

fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}

async fn classify_intent(
    llm: &dyn MultimodalLlmProvider,
    state: &ToolCallState,
) -> IntentClassification {
    let system_prompt = "Decide whether answering the user's query requires an external tool. \
        Respond with JSON: {\"needs_tool\": bool, \"intent_type\": \"ask\"|\"none\", \"confidence\": 0..1, \"reasoning\": string}.";
    let user_message = format!(
        "Conversation:\n{}\n\nScreen context:\n{}\n\nQuery: {}",
        state.conversation_context, state.screen_context, state.user_query
    );
    match ask_json::<IntentClassification>(llm, system_prompt, &user_message).await {
        Ok(v) => v,
        Err(_) => IntentClassification {
            needs_tool: false,
            confidence: 0.0,
        },
    }
}

async fn select_tool(
    llm: &dyn MultimodalLlmProvider,
    state: &ToolCallState,
) -> Result<ToolSelection> {
    let system_prompt = "Pick exactly one tool name from the provided list that best serves the \
        query. Respond with JSON: {\"selected_tool\": string, \"reasoning\": string, \"confidence\": 0..1}.";
    let user_message = format!(
        "Available tools: {}\n\nQuery: {}",
        state.available_tools.join(", "),
        state.user_query
    );
    ask_json(llm, system_prompt, &user_message).await
}

async fn optimize_parameters(
    llm: &dyn MultimodalLlmProvider,
    state: &ToolCallState,
    tool_name: &str,
) -> Result<OptimizedParameters> {
    let system_prompt = "Rewrite the user's query for the chosen tool, draft a concise system \
        prompt for the tool call, and produce a JSON search-parameter object. Incorporate screen \
        context when it is non-empty. Respond with JSON: {\"rewritten_query\": string, \
        \"system_prompt\": string, \"search_parameters\": object}.";
    let user_message = format!(
        "Tool: {tool_name}\nQuery: {}\nScreen context: {}",
        state.user_query, state.screen_context
    );
    ask_json(llm, system_prompt, &user_message).await
}

/// Returns `None` on failure. `ToolHandle::handle_tool_call` signals failure
/// by returning its input unchanged rather than by an empty string, so a
/// successful call is detected by the response actually differing from the
/// raw request we sent.
async fn execute_tool(
    tool_handle: &ToolHandle,
    tool_name: &str,
    system_prompt: &str,
    rewritten_query: &str,
) -> Option<String> {
    let raw = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {
            "name": tool_name,
            "arguments": {
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": rewritten_query},
                ]
            }
        }
    })
    .to_string();
    let response = tool_handle.handle_tool_call(&raw).await;
    (response != raw).then_some(response)
}

async fn parse_response(
    llm: &dyn MultimodalLlmProvider,
    raw_response: &str,
) -> Result<ParsedResponse> {
    let system_prompt = "Extract the answer body, any citations, a quality score in [0,1], and a \
        list of issues from this raw tool response. Respond with JSON: {\"body\": string, \
        \"citations\": string, \"quality_score\": 0..1, \"issues\": [string, ...]}.";
    ask_json(llm, system_prompt, raw_response).await
}

async fn synthesize_result(
    llm: &dyn MultimodalLlmProvider,
    state: &ToolCallState,
    parsed: &ParsedResponse,
) -> Result<String> {
    let resp = llm
        .generate(MultimodalRequest {
            system_prompt: "Produce the final conversational answer for the user from the \
                parsed tool content, staying consistent with the conversation and screen context."
                .to_string(),
            messages: vec![MultimodalMessage {
                role: "user".to_string(),
                content: format!(
                    "Original query: {}\nConversation: {}\nScreen context: {}\nParsed body: {}\nCitations: {}",
                    state.user_query, state.conversation_context, state.screen_context, parsed.body, parsed.citations
                ),
            }],
            image: None,
            tools: Vec::new(),
        })
        .await?;
    Ok(resp.text)
}

fn handle_error(error_messages: &[String]) -> String {
    if error_messages.is_empty() {
        "I ran into trouble using a tool for that, but let me try to help directly.".to_string()
    } else {
        format!(
            "I ran into trouble using a tool for that ({}), but let me try to help directly.",
            error_messages.join("; ")
        )
    }
}

/// Run the workflow with a 45 s wall-clock ceiling. `None` means the ceiling
/// was hit; the caller falls back to the direct LLM path.
pub async fn run(
    config: &WorkflowConfig,
    llm: &dyn MultimodalLlmProvider,
    tool_handle: &ToolHandle,
    state: ToolCallState,
) -> Option<WorkflowOutcome> {
    tokio::time::timeout(
        Duration::from_secs(config.timeout_secs),
        run_inner(config, llm, tool_handle, state),
    )
    .await
    .ok()
}

async fn run_inner(
    config: &WorkflowConfig,
    llm: &dyn MultimodalLlmProvider,
    tool_handle: &ToolHandle,
    state: ToolCallState,
) -> WorkflowOutcome {
    let intent = classify_intent(llm, &state).await;
    if !intent.needs_tool {
        let text = direct_response(llm, &state).await;
        return WorkflowOutcome {
            needs_tool: false,
            execution_success: false,
            quality_score: 0.0,
            final_text: text,
            tool_name: None,
            attempts: 0,
        };
    }

    let Ok(selection) = select_tool(llm, &state).await else {
        return WorkflowOutcome {
            needs_tool: true,
            execution_success: false,
            quality_score: 0.0,
            final_text: handle_error(&["tool selection failed".to_string()]),
            tool_name: None,
            attempts: 0,
        };
    };

    let mut error_messages = Vec::new();
    let mut attempts = 0u32;
    let mut raw_response: Option<String> = None;

    let mut params = match optimize_parameters(llm, &state, &selection.selected_tool).await {
        Ok(p) => Some(p),
        Err(_) => {
            error_messages.push("parameter optimization failed".to_string());
            None
        }
    };

    while let Some(current) = params.take() {
        attempts += 1;
        let response = execute_tool(
            tool_handle,
            &selection.selected_tool,
            &current.system_prompt,
            &current.rewritten_query,
        )
        .await;

        if let Some(response) = response {
            raw_response = Some(response);
            break;
        }

        error_messages.push(format!("tool execution failed (attempt {attempts})"));
        if attempts >= config.max_retries {
            break;
        }

        params = if config.reoptimize_on_retry {
            match optimize_parameters(llm, &state, &selection.selected_tool).await {
                Ok(p) => Some(p),
                Err(_) => {
                    error_messages.push("parameter optimization failed".to_string());
                    None
                }
            }
        } else {
            // Re-issue with the existing parameters rather than re-entering
            // optimize_parameters again.
            Some(current)
        };
    }

    let Some(raw_response) = raw_response else {
        return WorkflowOutcome {
            needs_tool: true,
            execution_success: false,
            quality_score: 0.0,
            final_text: handle_error(&error_messages),
            tool_name: Some(selection.selected_tool),
            attempts,
        };
    };

    let parsed = match parse_response(llm, &raw_response).await {
        Ok(p) => p,
        Err(_) => {
            return WorkflowOutcome {
                needs_tool: true,
                execution_success: true,
                quality_score: 0.0,
                final_text: handle_error(&["could not parse tool response".to_string()]),
                tool_name: Some(selection.selected_tool),
                attempts,
            }
        }
    };

    let final_text = match synthesize_result(llm, &state, &parsed).await {
        Ok(text) => text,
        Err(_) => parsed.body.clone(),
    };

    WorkflowOutcome {
        needs_tool: true,
        execution_success: true,
        quality_score: parsed.quality_score,
        final_text,
        tool_name: Some(selection.selected_tool),
        attempts,
    }
}

async fn direct_response(llm: &dyn MultimodalLlmProvider, state: &ToolCallState) -> String {
    let mut prompt = format!(
        "Reply conversationally and briefly to: {}",
        state.user_query
    );
    if !state.screen_context.trim().is_empty() {
        prompt.push_str(&format!("\n\nScreen context: {}", state.screen_context));
    }
    match llm
        .generate(MultimodalRequest {
            system_prompt: "Produce a short, non-tool conversational reply.".to_string(),
            messages: vec![MultimodalMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            image: None,
            tools: Vec::new(),
        })
        .await
    {
        Ok(resp) => resp.text,
        Err(_) => "I'm not sure how to help with that right now.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_span_from_surrounding_prose() {
        let text = "Sure, here you go: {\"a\": 1} hope that helps";
        assert_eq!(extract_json_span(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn no_json_span_returns_none() {
        assert_eq!(extract_json_span("no json here"), None);
    }

    #[test]
    fn low_quality_outcome_is_not_usable() {
        let outcome = WorkflowOutcome {
            needs_tool: true,
            execution_success: true,
            quality_score: 0.4,
            final_text: "x".to_string(),
            tool_name: None,
            attempts: 1,
        };
        assert!(!outcome.usable(0.6));
    }

    #[test]
    fn high_quality_outcome_is_usable() {
        let outcome = WorkflowOutcome {
            needs_tool: true,
            execution_success: true,
            quality_score: 0.6,
            final_text: "x".to_string(),
            tool_name: None,
            attempts: 1,
        };
        assert!(outcome.usable(0.6));
    }

    #[test]
    fn no_tool_needed_is_not_usable_regardless_of_score() {
        let outcome = WorkflowOutcome {
            needs_tool: false,
            execution_success: true,
            quality_score: 1.0,
            final_text: "x".to_string(),
            tool_name: None,
            attempts: 0,
        };
        assert!(!outcome.usable(0.6));
    }
}
