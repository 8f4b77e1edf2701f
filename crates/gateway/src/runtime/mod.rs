//! Runtime orchestration specific to this binary: the tool-calling
//! workflow (C6) and the multimodal orchestrator (C7) that drives it.

pub mod orchestrator;
pub mod workflow;

pub use orchestrator::{run_turn, TurnInput, TurnOutput};
