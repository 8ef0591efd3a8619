//! End-to-end extraction: one card image in, normalized contacts out.
//!
//! The orchestrator is the only entry point for raw images. It composes
//! OCR → structuring → normalization strictly in sequence for one request;
//! concurrent requests are independent tasks with no ordering between them.
//! It performs no retry: any failure from the extractor or the structuring
//! stage propagates unmodified, and a cancelled request returns nothing
//! rather than partial contacts.

use crate::config::settings;
use crate::contact::ContactBatch;
use crate::error::CardScanError;
use crate::pipeline::normalize::{normalize_email, normalize_phone};
use crate::pipeline::ocr::{self, OcrEngine};
use crate::stages::ContactModel;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Extraction metadata returned alongside the contacts, useful for auditing
/// low-confidence extractions downstream.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionMeta {
    pub ocr_confidence: f64,
    pub ocr_text: String,
}

/// The end-to-end result of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    pub contacts: ContactBatch,
    pub meta: ExtractionMeta,
}

/// Run the full pipeline with the configured OCR backend and the shared
/// model client.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// - [`CardScanError::UnreadableImage`] — bytes are not a decodable image
/// - [`CardScanError::OcrUnavailable`] / [`CardScanError::UnsupportedOcrProvider`]
///   — OCR backend absent or misconfigured
/// - [`CardScanError::ModelUnconfigured`] — no generative-backend credentials
/// - [`CardScanError::SchemaViolation`] — model output failed validation
pub async fn extract(image_bytes: Vec<u8>) -> Result<ExtractionOutput, CardScanError> {
    let settings = settings()?;
    let engine = ocr::engine_from_settings(settings);
    let model = ContactModel::shared()?;
    extract_with(engine, &model, image_bytes).await
}

/// Run the full pipeline with explicit collaborators.
///
/// Substitute engines and models keep the orchestrator testable without
/// Tesseract or network access.
pub async fn extract_with(
    engine: Arc<dyn OcrEngine>,
    model: &ContactModel,
    image_bytes: Vec<u8>,
) -> Result<ExtractionOutput, CardScanError> {
    info!(bytes = image_bytes.len(), "starting contact extraction");

    // ── Step 1: Recover text from the image ──────────────────────────────
    let ocr_result = ocr::run_ocr(engine, image_bytes).await?;
    info!(
        chars = ocr_result.text.len(),
        confidence = ocr_result.confidence,
        "OCR complete"
    );

    // ── Step 2: Structure the text into contacts ─────────────────────────
    let structured = model.structure(&ocr_result.text).await?;

    // ── Step 3: Normalize fields, default missing confidence ─────────────
    let mut contacts = structured;
    for contact in &mut contacts.contacts {
        contact.phone = normalize_phone(contact.phone.as_deref());
        contact.email = normalize_email(contact.email.as_deref());
        // Propagate OCR certainty when the model did not supply its own.
        if contact.confidence.is_none() {
            contact.confidence = Some(ocr_result.confidence);
        }
    }

    info!(contacts = contacts.len(), "extraction complete");

    Ok(ExtractionOutput {
        contacts,
        meta: ExtractionMeta {
            ocr_confidence: ocr_result.confidence,
            ocr_text: ocr_result.text,
        },
    })
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(image_bytes: Vec<u8>) -> Result<ExtractionOutput, CardScanError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CardScanError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(image_bytes))
}
