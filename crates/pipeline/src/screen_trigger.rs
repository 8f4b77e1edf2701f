//! Screen-trigger detector (C8): a lexical heuristic deciding whether a
//! transcript should defer for a screen capture before the turn proceeds.

const EXPLICIT_TRIGGERS: &[&str] = &[
    "screen",
    "display",
    "see",
    "look",
    "show",
    "what's on",
    "this page",
    "this screen",
    "my screen",
    "what am i",
    "where am i",
    "help with this",
    "what do you see",
    "can you see",
    "describe",
    "read this",
];

const CONTEXT_WORDS: &[&str] = &[
    "error",
    "issue",
    "problem",
    "bug",
    "broken",
    "not working",
    "help",
    "stuck",
    "confused",
    "understand",
    "explain",
    "debug",
    "fix",
];

const QUESTION_INDICATORS: &[&str] = &[
    "what",
    "how",
    "where",
    "why",
    "which",
    "when",
    "can you",
    "could you",
    "would you",
    "should i",
    "do i",
    "am i",
    "is this",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerResult {
    pub confidence: f32,
    pub reason: &'static str,
    pub trigger_matches: Vec<String>,
    pub context_matches: Vec<String>,
}

impl TriggerResult {
    /// A trigger fires only when `screen_share_on` is also true; callers
    /// check that independently of this heuristic's raw confidence.
    pub fn fires(&self) -> bool {
        self.confidence >= 0.6
    }
}

fn matches_of<'a>(lowered: &str, lexicon: &'a [&'static str]) -> Vec<String> {
    lexicon
        .iter()
        .filter(|word| lowered.contains(*word))
        .map(|w| w.to_string())
        .collect()
}

fn starts_with_question_indicator(lowered: &str) -> bool {
    QUESTION_INDICATORS.iter().any(|q| lowered.starts_with(q))
}

fn token_count(lowered: &str) -> usize {
    lowered.split_whitespace().count()
}

/// Score a lowercased transcript against the three disjoint lexicons.
pub fn classify(transcript: &str) -> TriggerResult {
    let lowered = transcript.to_lowercase();
    let trigger_matches = matches_of(&lowered, EXPLICIT_TRIGGERS);
    let context_matches = matches_of(&lowered, CONTEXT_WORDS);
    let has_question = QUESTION_INDICATORS.iter().any(|q| lowered.contains(q));
    let tokens = token_count(&lowered);

    let (confidence, reason) = if !trigger_matches.is_empty() {
        (0.9, "explicit_trigger")
    } else if !context_matches.is_empty() && starts_with_question_indicator(&lowered) {
        (0.8, "context_question")
    } else if !context_matches.is_empty() && tokens > 3 {
        (0.6, "context_phrase")
    } else if has_question && tokens > 4 {
        (0.5, "general_question")
    } else {
        (0.0, "no_triggers")
    };

    TriggerResult {
        confidence,
        reason,
        trigger_matches,
        context_matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_trigger_scores_highest() {
        let result = classify("what do you see on my screen");
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.reason, "explicit_trigger");
        assert!(result.fires());
    }

    #[test]
    fn context_word_with_leading_question_scores_point_eight() {
        let result = classify("why is there a bug here");
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.reason, "context_question");
    }

    #[test]
    fn context_word_with_long_phrase_scores_point_six() {
        let result = classify("there seems to be a problem somewhere");
        assert_eq!(result.confidence, 0.6);
        assert_eq!(result.reason, "context_phrase");
        assert!(result.fires());
    }

    #[test]
    fn bare_question_with_enough_tokens_scores_point_five() {
        let result = classify("what is the weather like today");
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.reason, "general_question");
        assert!(!result.fires());
    }

    #[test]
    fn unrelated_short_utterance_scores_zero() {
        let result = classify("hello there");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.reason, "no_triggers");
    }
}
