//! Multimodal orchestrator (C7): builds the per-turn context, optionally
//! decodes and analyzes a screen image, routes through the tool-calling
//! workflow (C6) when it clears the quality gate, and otherwise falls back
//! to a direct LLM generation.

use scry_domain::conversation::ConversationEntry;
use scry_providers::image_codec::ImageCodec;
use scry_providers::traits::{MultimodalMessage, MultimodalRequest};

use crate::runtime::workflow::{self, ToolCallState};
use crate::state::AppState;

pub struct TurnInput {
    pub session_id: String,
    pub user_text: String,
    pub screen_image_base64: Option<String>,
    pub tool_calling_enabled: bool,
}

pub struct TurnOutput {
    pub text: String,
    pub screen_context: Option<String>,
}

const RECENT_ENTRIES: usize = 10;
const ANALYSIS_INTERVAL_SECS: i64 = 5;

fn format_preamble(available_tools: &[String], has_image: bool) -> String {
    let tools_line = if available_tools.is_empty() {
        "No tools available".to_string()
    } else {
        available_tools.join(", ")
    };
    if has_image {
        format!("Available tools: {tools_line}\n\nScreen sharing is ENABLED. I can see your screen and will provide contextual assistance.")
    } else {
        format!("Available tools: {tools_line}\n\nScreen sharing is currently OFF/DISABLED. I cannot see the user's screen. Do not make up or hallucinate screen content.")
    }
}

fn format_conversation_context(entries: &[ConversationEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{:?}: {}", e.role, e.content))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn analyze_screen(state: &AppState, base64_data: &str) -> scry_domain::error::Result<String> {
    if let Some(cached) = state
        .screen_cache
        .get(base64_data.len(), ANALYSIS_INTERVAL_SECS)
    {
        return Ok(cached);
    }

    let decoded = ImageCodec::decode_and_resize(base64_data, state.config.screen.max_image_size)?;
    let response = state
        .llm
        .generate(MultimodalRequest {
            system_prompt: "Describe what is visible on this screen in 2-3 sentences: main UI \
                elements, the application in use, and any errors or status indicators. Do not \
                answer the user's question, only describe the screen."
                .to_string(),
            messages: Vec::new(),
            image: Some(decoded),
            tools: Vec::new(),
        })
        .await?;

    let analysis = response.text.trim().to_string();
    state
        .screen_cache
        .put(base64_data.len(), ANALYSIS_INTERVAL_SECS, analysis.clone());
    Ok(analysis)
}

/// Run one conversational turn: build context, optionally analyze the
/// screen, try the tool-calling workflow, fall back to a direct LLM call,
/// then append both turn halves to conversation memory.
pub async fn run_turn(state: &AppState, input: TurnInput) -> TurnOutput {
    let available_tools = state.tool_client.list_tools().await.unwrap_or_default();
    let recent = state.memory.recent(&input.session_id, RECENT_ENTRIES);
    let conversation_context = format_conversation_context(&recent);

    let screen_analysis = match &input.screen_image_base64 {
        Some(b64) => match analyze_screen(state, b64).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = %e, "screen analysis failed");
                None
            }
        },
        None => None,
    };

    let has_image = screen_analysis.is_some();
    let preamble = format_preamble(&available_tools, has_image);
    let screen_context = screen_analysis.clone().unwrap_or_default();

    let augmented_query = match &screen_analysis {
        Some(analysis) => format!("{}\n\nScreen context: {analysis}", input.user_text),
        None => input.user_text.clone(),
    };

    let mut final_text = None;
    let mut tool_used = false;
    let mut quality_score = None;

    if input.tool_calling_enabled {
        let workflow_state = ToolCallState {
            user_query: augmented_query,
            conversation_context: conversation_context.clone(),
            screen_context: screen_context.clone(),
            session_id: input.session_id.clone(),
            available_tools: available_tools.clone(),
        };
        if let Some(outcome) = workflow::run(
            &state.config.workflow,
            state.llm.as_ref(),
            state.tool_handle.as_ref(),
            workflow_state,
        )
        .await
        {
            if outcome.usable(state.config.workflow.quality_score_threshold) {
                tool_used = true;
                quality_score = Some(outcome.quality_score);
                final_text = Some(outcome.final_text);
            }
        }
    }

    let text = match final_text {
        Some(text) => text,
        None => {
            let resp = state
                .llm
                .generate(MultimodalRequest {
                    system_prompt: preamble,
                    messages: vec![MultimodalMessage {
                        role: "user".to_string(),
                        content: format!("{}\n\n{}", conversation_context, input.user_text),
                    }],
                    image: None,
                    tools: Vec::new(),
                })
                .await
                .map(|r| r.text)
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "direct LLM generation failed");
                    String::new()
                });
            resp
        }
    };

    let text = text.trim();
    let text = if text.is_empty() {
        "I couldn't generate a response".to_string()
    } else {
        text.to_string()
    };

    let had_screen = has_image;
    state.memory.append(
        &input.session_id,
        ConversationEntry::user(&input.user_text).with_screen_flag(had_screen),
    );
    state.memory.append(
        &input.session_id,
        ConversationEntry::assistant(&text)
            .with_screen_flag(had_screen)
            .with_tool_usage(tool_used, quality_score),
    );

    TurnOutput {
        text,
        screen_context: screen_analysis,
    }
}
