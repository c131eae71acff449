//! JSON summary extraction
//!
//! The reporter ends its text with a fenced ```` ```json ```` block. Finding it
//! is best-effort: callers treat a miss as "no summary", not as a failure.

use crate::error::ExtractionError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("JSON block pattern is valid")
});

/// Locate and parse the first fenced JSON object in `text`
///
/// # Errors
/// - `ExtractionError::NotFound` if there is no fenced JSON object
/// - `ExtractionError::Invalid` if the block does not parse
pub fn extract_json_summary(text: &str) -> Result<Value, ExtractionError> {
    let captures = JSON_BLOCK.captures(text).ok_or(ExtractionError::NotFound)?;
    let block = captures.get(1).ok_or(ExtractionError::NotFound)?;
    Ok(serde_json::from_str(block.as_str())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_block() {
        let text = "Final report.\n\n```json\n{\"verdict\": \"bug\", \"confidence\": 90}\n```\nDone.";
        let value = extract_json_summary(text).unwrap();
        assert_eq!(value["verdict"], "bug");
        assert_eq!(value["confidence"], 90);
    }

    #[test]
    fn nested_objects_survive_lazy_match() {
        let text = "```json\n{\"a\": {\"b\": 1}}\n```";
        let value = extract_json_summary(text).unwrap();
        assert_eq!(value["a"]["b"], 1);
    }

    #[test]
    fn first_block_wins() {
        let text = "```json\n{\"n\": 1}\n```\n```json\n{\"n\": 2}\n```";
        assert_eq!(extract_json_summary(text).unwrap()["n"], 1);
    }

    #[test]
    fn missing_block() {
        assert!(matches!(
            extract_json_summary("no json here"),
            Err(ExtractionError::NotFound)
        ));
        assert!(matches!(
            extract_json_summary("```\n{\"a\": 1}\n```"),
            Err(ExtractionError::NotFound)
        ));
    }

    #[test]
    fn malformed_block() {
        let text = "```json\n{\"a\": }\n```";
        assert!(matches!(
            extract_json_summary(text),
            Err(ExtractionError::Invalid(_))
        ));
    }
}
