//! Speech-session accumulator (C3): folds VAD-gated audio frames into
//! complete utterances.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use scry_domain::audio::{AudioChunk, AudioFrame};
use scry_domain::config::SpeechConfig;

struct ActiveSession {
    session_id: String,
    start_timestamp: f64,
    last_audio_timestamp: f64,
    buffer: Vec<f32>,
    sample_rate: u32,
}

impl ActiveSession {
    fn duration_secs(&self) -> f64 {
        self.buffer.len() as f64 / self.sample_rate as f64
    }
}

/// Holds at most one active speech session per connection. `push` folds in
/// one audio frame and returns a completed [`AudioChunk`] when the session
/// just closed with enough accumulated speech to transcribe.
pub struct SpeechAccumulator {
    config: SpeechConfig,
    sessions: Mutex<HashMap<String, ActiveSession>>,
    next_seq: AtomicU64,
}

impl SpeechAccumulator {
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
        }
    }

    pub fn push(&self, connection_id: &str, frame: AudioFrame) -> Option<AudioChunk> {
        let mut sessions = self.sessions.lock();

        if !sessions.contains_key(connection_id) {
            if frame.vad.is_speaking {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                sessions.insert(
                    connection_id.to_string(),
                    ActiveSession {
                        session_id: format!("{seq}-{}", frame.timestamp),
                        start_timestamp: frame.timestamp,
                        last_audio_timestamp: frame.timestamp,
                        buffer: frame.samples,
                        sample_rate: frame.sample_rate,
                    },
                );
            }
            return None;
        }

        let session = sessions.get_mut(connection_id).expect("checked above");
        session.buffer.extend_from_slice(&frame.samples);
        let gap = frame.timestamp - session.last_audio_timestamp;
        session.last_audio_timestamp = frame.timestamp;

        let should_complete = session.duration_secs() >= self.config.max_speech_duration_secs
            || gap > self.config.inter_frame_gap_secs
            || !frame.vad.is_speaking;

        if !should_complete {
            return None;
        }

        let session = sessions.remove(connection_id).expect("checked above");
        self.finish(session)
    }

    /// Complete the current session unconditionally, subject to the same
    /// min-duration discard rule. A no-op if no session is active.
    pub fn flush(&self, connection_id: &str) -> Option<AudioChunk> {
        let session = self.sessions.lock().remove(connection_id)?;
        self.finish(session)
    }

    fn finish(&self, session: ActiveSession) -> Option<AudioChunk> {
        let duration = session.duration_secs();
        if duration < self.config.min_speech_duration_secs {
            return None;
        }
        Some(AudioChunk {
            data: session.buffer,
            sample_rate: session.sample_rate,
            timestamp: session.start_timestamp,
            chunk_id: format!("speech_session_{}", session.session_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scry_domain::audio::VadHint;

    fn frame(is_speaking: bool, n_samples: usize, timestamp: f64) -> AudioFrame {
        AudioFrame {
            samples: vec![0.0; n_samples],
            sample_rate: 16_000,
            vad: VadHint {
                is_speaking,
                energy: None,
                confidence: None,
            },
            timestamp,
        }
    }

    #[test]
    fn silence_never_produces_a_chunk() {
        let acc = SpeechAccumulator::new(SpeechConfig::default());
        for i in 0..20 {
            assert!(acc.push("conn1", frame(false, 100, i as f64 * 0.1)).is_none());
        }
    }

    #[test]
    fn short_burst_is_discarded() {
        let acc = SpeechAccumulator::new(SpeechConfig::default());
        // 0.3s at 16kHz = 4800 samples.
        assert!(acc.push("conn1", frame(true, 4_800, 0.0)).is_none());
        assert!(acc.push("conn1", frame(false, 0, 0.3)).is_none());
    }

    #[test]
    fn sufficient_speech_emits_chunk_on_vad_false() {
        let acc = SpeechAccumulator::new(SpeechConfig::default());
        // 1s at 16kHz.
        assert!(acc.push("conn1", frame(true, 16_000, 0.0)).is_none());
        let chunk = acc.push("conn1", frame(false, 0, 1.0)).unwrap();
        assert_eq!(chunk.data.len(), 16_000);
        assert_eq!(chunk.chunk_id, format!("speech_session_1-0"));
    }

    #[test]
    fn max_duration_forces_completion_while_still_speaking() {
        let acc = SpeechAccumulator::new(SpeechConfig::default());
        assert!(acc.push("conn1", frame(true, 16_000, 0.0)).is_none());
        // One more second per push, gap always 1s (never triggers the gap
        // rule); the 30th cumulative second should force completion purely
        // via the max-duration rule while `isSpeaking` is still true.
        let mut chunk = None;
        for i in 1..30 {
            chunk = acc.push("conn1", frame(true, 16_000, i as f64));
            if i < 29 {
                assert!(chunk.is_none(), "completed early at second {i}");
            }
        }
        let chunk = chunk.unwrap();
        assert_eq!(chunk.data.len(), 16_000 * 30);
    }

    #[test]
    fn gap_of_exactly_two_seconds_does_not_complete() {
        let acc = SpeechAccumulator::new(SpeechConfig::default());
        assert!(acc.push("conn1", frame(true, 16_000, 0.0)).is_none());
        assert!(acc.push("conn1", frame(true, 16_000, 2.0)).is_none());
    }

    #[test]
    fn gap_over_two_seconds_completes() {
        let acc = SpeechAccumulator::new(SpeechConfig::default());
        assert!(acc.push("conn1", frame(true, 16_000, 0.0)).is_none());
        let chunk = acc.push("conn1", frame(true, 16_000, 2.1)).unwrap();
        assert_eq!(chunk.data.len(), 16_000);
    }

    #[test]
    fn only_one_active_session_per_connection() {
        let acc = SpeechAccumulator::new(SpeechConfig::default());
        assert!(acc.push("conn1", frame(true, 16_000, 0.0)).is_none());
        assert_eq!(acc.sessions.lock().len(), 1);
        let _ = acc.push("conn1", frame(false, 0, 1.0));
        assert_eq!(acc.sessions.lock().len(), 0);
    }

    #[test]
    fn flush_completes_unconditionally_subject_to_min_duration() {
        let acc = SpeechAccumulator::new(SpeechConfig::default());
        assert!(acc.push("conn1", frame(true, 16_000, 0.0)).is_none());
        let chunk = acc.flush("conn1").unwrap();
        assert_eq!(chunk.data.len(), 16_000);
        assert!(acc.flush("conn1").is_none());
    }
}
