//! Recover a JSON payload from free-form model output.
//!
//! Models are asked for bare JSON but regularly wrap it in a markdown fence
//! or surround it with a sentence of prose. Three strategies are tried in
//! order and the first that parses wins:
//!
//! 1. the whole reply,
//! 2. a fenced code block (optionally tagged `json`) holding an object,
//! 3. the span from the first `{` to the last `}`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ParseFailure;

/// Fenced block containing a brace-delimited object, with optional `json` tag.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FENCED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("valid regex")
});

/// Extract and parse the JSON payload from a model reply.
pub fn extract_json(response: &str) -> Result<Value, ParseFailure> {
    let trimmed = response.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    for block in fenced_objects(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(block) {
            return Ok(value);
        }
    }

    let Some(span) = brace_span(trimmed) else {
        return Err(ParseFailure {
            reason: "no JSON object found".into(),
            raw: response.to_string(),
        });
    };

    serde_json::from_str::<Value>(span).map_err(|e| ParseFailure {
        reason: format!("invalid JSON: {e}"),
        raw: response.to_string(),
    })
}

/// Contents of every fenced block that looks like a JSON object.
fn fenced_objects(text: &str) -> Vec<&str> {
    FENCED_OBJECT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Greedy span from the first `{` to the last `}`.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAYLOAD: &str = r#"{"score": 85, "item_analysis": [], "overall_feedback": "Good", "suggestions": "Keep {reading}"}"#;

    fn expected() -> Value {
        serde_json::from_str(PAYLOAD).expect("payload")
    }

    #[test]
    fn test_extract_bare() {
        assert_eq!(extract_json(PAYLOAD).expect("bare"), expected());
    }

    #[test]
    fn test_extract_bare_with_whitespace() {
        let input = format!("\n\n  {PAYLOAD}  \n");
        assert_eq!(extract_json(&input).expect("bare"), expected());
    }

    #[test]
    fn test_extract_fenced_json() {
        let input = format!("```json\n{PAYLOAD}\n```");
        assert_eq!(extract_json(&input).expect("fenced"), expected());
    }

    #[test]
    fn test_extract_fenced_untagged() {
        let input = format!("Here you go:\n```\n{PAYLOAD}\n```\nEnjoy!");
        assert_eq!(extract_json(&input).expect("fenced"), expected());
    }

    #[test]
    fn test_extract_embedded_in_prose() {
        let input = format!("Sure! Here is the evaluation: {PAYLOAD} Let me know if you need more.");
        assert_eq!(extract_json(&input).expect("prose"), expected());
    }

    #[test]
    fn test_all_encodings_agree() {
        let bare = extract_json(PAYLOAD).expect("bare");
        let fenced = extract_json(&format!("```json\n{PAYLOAD}\n```")).expect("fenced");
        let prose = extract_json(&format!("Result:\n{PAYLOAD}\nThanks.")).expect("prose");
        assert_eq!(bare, fenced);
        assert_eq!(fenced, prose);
    }

    #[test]
    fn test_skips_unparseable_fence_and_falls_through() {
        // First fence holds broken JSON, the second one is used.
        let input = format!("```json\n{{not json}}\n```\nActually:\n```json\n{PAYLOAD}\n```");
        assert_eq!(extract_json(&input).expect("second fence"), expected());
    }

    #[test]
    fn test_no_payload() {
        let err = extract_json("I'm sorry, I can't help with that.").expect_err("no json");
        assert_eq!(err.reason, "no JSON object found");
        assert_eq!(err.raw, "I'm sorry, I can't help with that.");
    }

    #[test]
    fn test_broken_payload() {
        let err = extract_json(r#"Here: {"score": 85, "item_analysis": [}"#).expect_err("broken");
        assert!(err.reason.starts_with("invalid JSON"));
    }

    #[test]
    fn test_reversed_braces() {
        assert!(extract_json("} nothing here {").is_err());
    }
}
