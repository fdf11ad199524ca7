//! Cleanup of raw model text before JSON parsing.

use docverify_core::VerifyError;
use serde::de::DeserializeOwned;

/// Remove markdown code-fence markers (```` ```json ```` and ```` ``` ````)
/// and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Strip fences and parse the remaining text as JSON.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, VerifyError> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(VerifyError::MalformedOutput("empty response".into()));
    }
    serde_json::from_str(&cleaned).map_err(|e| VerifyError::MalformedOutput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docverify_core::FieldSet;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"name\": \"A\"}\n```\n";
        assert_eq!(strip_code_fences(raw), "{\"name\": \"A\"}");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\":\"b\"} "), "{\"a\":\"b\"}");
    }

    #[test]
    fn parses_fenced_object() {
        let fields: FieldSet = parse_model_json("```\n{\"dob\":\"1990-01-01\"}\n```").unwrap();
        assert_eq!(fields.get("dob"), Some("1990-01-01"));
    }

    #[test]
    fn rejects_prose() {
        let err = parse_model_json::<FieldSet>("Sorry, I cannot read this image.").unwrap_err();
        assert!(matches!(err, VerifyError::MalformedOutput(_)));
    }

    #[test]
    fn rejects_empty_after_stripping() {
        let err = parse_model_json::<FieldSet>("```json\n```").unwrap_err();
        assert!(matches!(err, VerifyError::MalformedOutput(_)));
    }
}
