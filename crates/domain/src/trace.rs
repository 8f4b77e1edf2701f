use serde::Serialize;

/// Structured trace events emitted across the gateway crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SpeechSessionStarted {
        session_id: String,
    },
    SpeechSessionCompleted {
        session_id: String,
        duration_secs: f64,
        reason: String,
    },
    SpeechSessionDiscarded {
        session_id: String,
        duration_secs: f64,
    },
    TranscriptionCompleted {
        session_id: String,
        text_chars: usize,
        duration_secs: f64,
    },
    ScreenTriggerDetected {
        confidence: f32,
        matched: String,
    },
    ToolWorkflowStarted {
        session_id: String,
        tool_name: Option<String>,
    },
    ToolWorkflowCompleted {
        session_id: String,
        tool_name: Option<String>,
        attempts: u32,
        quality_score: Option<f32>,
        used_tool: bool,
    },
    PerformanceAlert {
        service: String,
        duration_secs: f64,
        threshold_secs: f64,
    },
    MemoryAppended {
        session_id: String,
        entries: usize,
    },
    ConnectionOpened {
        session_id: String,
    },
    ConnectionClosed {
        session_id: String,
        consecutive_send_failures: u32,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "gateway_event");
    }
}
