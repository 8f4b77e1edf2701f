//! The tool handle (C2): normalizes raw tool-server output into clean text.

use std::sync::Arc;

use crate::client::ToolClient;

/// Strips a leading/trailing code fence (```` ``` ```` or ```` ```json ````)
/// around a JSON payload, if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\n', '\r']);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub struct ToolHandle {
    client: Arc<ToolClient>,
}

impl ToolHandle {
    pub fn new(client: Arc<ToolClient>) -> Self {
        Self { client }
    }

    /// Strip code-fence markers, delegate to C1, extract
    /// `result.content[0].text` when present. On any failure, return the
    /// input unchanged.
    pub async fn handle_tool_call(&self, text: &str) -> String {
        let stripped = strip_code_fences(text);
        match self.client.tool_call(stripped).await {
            Some(value) => value
                .pointer("/result/content/0/text")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| text.to_string()),
            None => text.to_string(),
        }
    }

    /// Split once at `"Citations:"`, clean the body of `[n]` citation
    /// markers and `**bold**` markers, and collapse whitespace runs.
    /// Returns `(body, citations_block)`; `citations_block` is empty when
    /// there was no `"Citations:"` delimiter.
    pub fn parse(text: &str) -> (String, String) {
        let (body, citations) = match text.split_once("Citations:") {
            Some((b, c)) => (b, format!("Citations:{}", c.trim_end())),
            None => (text, String::new()),
        };
        (clean_text(body), citations)
    }
}

fn clean_text(text: &str) -> String {
    let without_citation_markers = strip_bracketed_numbers(text);
    let without_bold = strip_bold_markers(&without_citation_markers);
    collapse_whitespace(&without_bold)
}

/// Removes `[n]`-style citation markers (digits only between brackets).
fn strip_bracketed_numbers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '[' {
            let mut digits = String::new();
            let mut rest = chars.clone();
            while let Some(&d) = rest.peek() {
                if d.is_ascii_digit() {
                    digits.push(d);
                    rest.next();
                } else {
                    break;
                }
            }
            if !digits.is_empty() && rest.peek() == Some(&']') {
                rest.next();
                chars = rest;
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Removes `**...**` bold markers, keeping the enclosed text.
fn strip_bold_markers(text: &str) -> String {
    text.replace("**", "")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_fences_removes_json_fence() {
        let input = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(input), "{\"a\":1}");
    }

    #[test]
    fn strip_code_fences_passthrough_without_fence() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn parse_splits_on_citations_once() {
        let (body, citations) = ToolHandle::parse("The answer is 42. Citations: [1] example.com");
        assert_eq!(body, "The answer is 42.");
        assert_eq!(citations, "Citations: [1] example.com");
    }

    #[test]
    fn parse_cleans_numbered_markers_and_bold() {
        let (body, _) = ToolHandle::parse("Result **bold** text[1] with   extra  spaces[23]");
        assert_eq!(body, "Result bold text with extra spaces");
    }

    #[test]
    fn parse_without_citations_delimiter_returns_empty_block() {
        let (body, citations) = ToolHandle::parse("just text");
        assert_eq!(body, "just text");
        assert_eq!(citations, "");
    }

    #[test]
    fn parse_does_not_strip_non_numeric_brackets() {
        let (body, _) = ToolHandle::parse("see [here] for details");
        assert_eq!(body, "see [here] for details");
    }
}
