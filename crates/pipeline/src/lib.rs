//! `scry-pipeline` — the in-process stream-processing stages: speech
//! accumulation (C3), performance monitoring (C4), conversation memory
//! (C5), and the screen-trigger heuristic (C8).

pub mod memory;
pub mod performance;
pub mod screen_trigger;
pub mod speech;

pub use memory::ConversationMemory;
pub use performance::{PerformanceMonitor, PerformanceTimer};
pub use screen_trigger::{classify, TriggerResult};
pub use speech::SpeechAccumulator;
