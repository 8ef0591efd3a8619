//! Error types for the cardscan library.
//!
//! One enum covers the whole taxonomy because every stage above the point of
//! detection propagates the error unmodified — there is no partial-success
//! path inside a single pipeline invocation. The variants split along the
//! boundaries callers care about:
//!
//! * client-input errors ([`CardScanError::UnreadableImage`]),
//! * service-configuration errors ([`CardScanError::OcrUnavailable`],
//!   [`CardScanError::UnsupportedOcrProvider`],
//!   [`CardScanError::ModelUnconfigured`]),
//! * service errors surfaced from the unreliable upstream producers
//!   ([`CardScanError::SchemaViolation`], [`CardScanError::ModelApiError`]).
//!
//! The model's unreliability is deliberately not hidden: malformed model
//! output fails closed as a schema violation rather than being repaired or
//! silently retried.

use thiserror::Error;

/// All errors returned by the cardscan library.
#[derive(Debug, Error)]
pub enum CardScanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The uploaded bytes could not be decoded as an image.
    #[error("Unable to read image data: {detail}\nEnsure a valid image file is uploaded.")]
    UnreadableImage { detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine is not installed or its binary cannot be located.
    #[error("Tesseract OCR is not available: {detail}\nInstall Tesseract or set TESSERACT_CMD to its binary.")]
    OcrUnavailable { detail: String },

    /// Configuration names an OCR provider this build does not support.
    #[error("Unsupported OCR provider: '{provider}'")]
    UnsupportedOcrProvider { provider: String },

    /// The OCR engine ran but failed on this image.
    #[error("OCR failed: {detail}")]
    OcrFailed { detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// No credentials configured for the generative backend.
    #[error("LLM backend is not configured.\n{hint}")]
    ModelUnconfigured { hint: String },

    /// The model API returned an error or no usable text.
    #[error("LLM API error: {message}")]
    ModelApiError { message: String },

    /// Model output failed JSON parsing or contact-schema validation.
    ///
    /// Raised by the response parser; never repaired or retried by the core.
    #[error("Model output violated the contact schema: {detail}")]
    SchemaViolation { detail: String },

    // ── Store errors ──────────────────────────────────────────────────────
    /// The contact store could not be opened or a statement failed.
    #[error("Contact store operation failed: {0}")]
    StoreFailed(#[from] rusqlite::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// A settings value failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CardScanError {
    /// Construct a schema violation with a human-readable detail string.
    pub fn schema(detail: impl Into<String>) -> Self {
        CardScanError::SchemaViolation {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_image_display() {
        let e = CardScanError::UnreadableImage {
            detail: "not a PNG".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("not a PNG"), "got: {msg}");
        assert!(msg.contains("valid image"));
    }

    #[test]
    fn ocr_unavailable_display_mentions_env_override() {
        let e = CardScanError::OcrUnavailable {
            detail: "binary not found".into(),
        };
        assert!(e.to_string().contains("TESSERACT_CMD"));
    }

    #[test]
    fn unsupported_provider_display() {
        let e = CardScanError::UnsupportedOcrProvider {
            provider: "easyocr".into(),
        };
        assert!(e.to_string().contains("easyocr"));
    }

    #[test]
    fn schema_violation_display() {
        let e = CardScanError::schema("missing field `contacts`");
        assert!(e.to_string().contains("missing field `contacts`"));
    }

    #[test]
    fn model_unconfigured_display() {
        let e = CardScanError::ModelUnconfigured {
            hint: "Set GEMINI_API_KEY".into(),
        };
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }
}
