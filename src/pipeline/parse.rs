//! Response parsing: free model output → validated [`ContactBatch`].
//!
//! The upstream producer is a free-text generator with no structural
//! guarantee, so parsing runs in two phases:
//!
//! 1. **String massaging** — models wrap replies in ``` fences despite the
//!    prompt forbidding it. [`strip_code_fence`] removes an outer fence and
//!    an optional `json` language tag, and nothing else.
//! 2. **Strict schema validation** — serde_json parse plus the confidence
//!    range check from [`ContactBatch::validate`].
//!
//! Anything that fails either phase is a schema violation; no repair is
//! attempted.

use crate::contact::ContactBatch;
use crate::error::CardScanError;
use tracing::debug;

/// Strip an outer code fence from a model reply.
///
/// A fence only counts when splitting on ``` yields at least three segments
/// (opening fence, body, closing fence); an unterminated fence leaves the
/// text untouched so the JSON parse below reports the real problem.
pub fn strip_code_fence(payload: &str) -> String {
    let trimmed = payload.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let segments: Vec<&str> = trimmed.split("```").collect();
    if segments.len() < 3 {
        return trimmed.to_string();
    }
    let mut content = segments[1];
    if let Some(tag) = content.get(..4) {
        if tag.eq_ignore_ascii_case("json") {
            content = &content[4..];
        }
    }
    content.trim().to_string()
}

/// Parse raw model output into a validated contact batch.
///
/// Any JSON or schema failure is a [`CardScanError::SchemaViolation`]; no
/// repair attempt is made.
pub fn parse_batch(raw: &str) -> Result<ContactBatch, CardScanError> {
    let payload = strip_code_fence(raw);
    debug!(bytes = payload.len(), "parsing model response");

    let batch: ContactBatch = serde_json::from_str(&payload)
        .map_err(|e| CardScanError::schema(format!("invalid JSON: {e}")))?;
    batch.validate()?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Contact;

    #[test]
    fn fence_stripped_with_language_tag() {
        let raw = "```json\n{\"contacts\": []}\n```";
        assert_eq!(strip_code_fence(raw), "{\"contacts\": []}");
    }

    #[test]
    fn fence_stripped_without_language_tag() {
        let raw = "```\n{\"contacts\": []}\n```";
        assert_eq!(strip_code_fence(raw), "{\"contacts\": []}");
    }

    #[test]
    fn unfenced_text_passes_through_trimmed() {
        assert_eq!(strip_code_fence("  {\"contacts\": []}  "), "{\"contacts\": []}");
    }

    #[test]
    fn unterminated_fence_is_left_alone() {
        // Fewer than three segments means this is not a well-formed fence;
        // the JSON parser should see the original text and fail honestly.
        let raw = "```json\n{\"contacts\": []}";
        assert_eq!(strip_code_fence(raw), raw.trim());
    }

    #[test]
    fn parse_valid_batch() {
        let batch = parse_batch(
            r#"{"contacts": [{"name": "John Smith", "phone": "+11234567890",
                "email": null, "company": null, "notes": null,
                "confidence": 0.9, "extra": {"job_title": "VP"}}]}"#,
        )
        .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.contacts[0].name.as_deref(), Some("John Smith"));
        assert_eq!(
            batch.contacts[0].extra.as_ref().unwrap()["job_title"],
            serde_json::json!("VP")
        );
    }

    #[test]
    fn parse_fenced_batch() {
        let batch =
            parse_batch("```json\n{\"contacts\": [{\"name\": \"Ada\"}]}\n```").unwrap();
        assert_eq!(batch.contacts[0].name.as_deref(), Some("Ada"));
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_batch("Sure! Here are the contacts you asked for.").unwrap_err();
        assert!(matches!(err, CardScanError::SchemaViolation { .. }));
    }

    #[test]
    fn rejects_missing_contacts_key() {
        // A bare array is not the documented shape.
        let err = parse_batch(r#"[{"name": "Ada"}]"#).unwrap_err();
        assert!(matches!(err, CardScanError::SchemaViolation { .. }));
    }

    #[test]
    fn rejects_empty_object() {
        let err = parse_batch("{}").unwrap_err();
        assert!(matches!(err, CardScanError::SchemaViolation { .. }));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let err = parse_batch(r#"{"contacts": [{"name": "Ada", "confidence": 2.0}]}"#)
            .unwrap_err();
        assert!(matches!(err, CardScanError::SchemaViolation { .. }));
    }

    #[test]
    fn round_trips_a_batch() {
        let batch = ContactBatch::new(vec![Contact {
            name: Some("Grace Hopper".into()),
            phone: Some("+16035551234".into()),
            email: Some("grace@navy.mil".into()),
            company: None,
            notes: Some("met at conference".into()),
            confidence: Some(0.87),
            extra: None,
        }]);
        let json = serde_json::to_string(&batch).unwrap();
        assert_eq!(parse_batch(&json).unwrap(), batch);
    }
}
