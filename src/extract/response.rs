//! Provider response cleanup and decoding.
//!
//! Models routinely wrap the requested JSON object in Markdown code fences
//! despite being asked not to. [`strip_code_fences`] removes both the
//! language-tagged opening marker and the bare closing marker before
//! [`decode_fields`] parses the remainder into [`ExtractedFields`].
//!
//! There is no partial decode: anything that is not a JSON object after
//! cleanup is an [`ExtractError::Malformed`].

use serde::Deserialize;

use super::client::ExtractError;

// ---------------------------------------------------------------------------
// ExtractedFields
// ---------------------------------------------------------------------------

/// The decoded extraction object, keys optionally present and types
/// untrusted.
///
/// `amount` stays a raw [`serde_json::Value`] because providers answer with
/// a number or a quoted string interchangeably; coercion happens during
/// normalisation, never here.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

// ---------------------------------------------------------------------------
// Cleanup & decode
// ---------------------------------------------------------------------------

/// Remove every ```` ```json ```` opening marker and bare ```` ``` ````
/// marker, then trim surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Decode cleaned response text into [`ExtractedFields`].
///
/// # Errors
///
/// [`ExtractError::Malformed`] when the text is not a valid JSON object of
/// the expected shape.
pub fn decode_fields(cleaned: &str) -> Result<ExtractedFields, ExtractError> {
    serde_json::from_str(cleaned).map_err(|e| ExtractError::Malformed(e.to_string()))
}

/// Convenience: cleanup + decode in one step, as the pipeline consumes it.
pub fn decode_response(raw: &str) -> Result<ExtractedFields, ExtractError> {
    decode_fields(&strip_code_fences(raw))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = r#"{"title":"Biryani","amount":100,"category":"Food","description":"Lunch","date":"2025-03-10"}"#;

    // ---- strip_code_fences ----

    #[test]
    fn unfenced_text_passes_through_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn json_tagged_fence_is_removed() {
        let fenced = format!("```json\n{PLAIN}\n```");
        assert_eq!(strip_code_fences(&fenced), PLAIN);
    }

    #[test]
    fn bare_fence_is_removed() {
        let fenced = format!("```\n{PLAIN}\n```");
        assert_eq!(strip_code_fences(&fenced), PLAIN);
    }

    #[test]
    fn repeated_fences_are_all_removed() {
        let fenced = format!("```json\n```json\n{PLAIN}\n```\n```");
        assert_eq!(strip_code_fences(&fenced), PLAIN);
    }

    // ---- decode ----

    #[test]
    fn fenced_and_unfenced_decode_identically() {
        let fenced = format!("```json\n{PLAIN}\n```");

        let a = decode_response(PLAIN).expect("plain decodes");
        let b = decode_response(&fenced).expect("fenced decodes");

        assert_eq!(a.title, b.title);
        assert_eq!(a.amount, b.amount);
        assert_eq!(a.category, b.category);
        assert_eq!(a.description, b.description);
        assert_eq!(a.date, b.date);
    }

    #[test]
    fn missing_keys_decode_as_none() {
        let fields = decode_response(r#"{"title":"Taxi"}"#).expect("decodes");
        assert_eq!(fields.title.as_deref(), Some("Taxi"));
        assert!(fields.amount.is_none());
        assert!(fields.category.is_none());
        assert!(fields.description.is_none());
        assert!(fields.date.is_none());
    }

    #[test]
    fn string_amount_is_preserved_untouched() {
        let fields = decode_response(r#"{"amount":"150"}"#).expect("decodes");
        assert_eq!(
            fields.amount,
            Some(serde_json::Value::String("150".into()))
        );
    }

    #[test]
    fn non_json_is_malformed() {
        let err = decode_response("Sorry, I could not parse that.").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn truncated_json_is_malformed() {
        let err = decode_response(r#"{"title":"Biry"#).unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let fields =
            decode_response(r#"{"title":"Taxi","confidence":0.93}"#).expect("decodes");
        assert_eq!(fields.title.as_deref(), Some("Taxi"));
    }
}
