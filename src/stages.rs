//! Model-driven stages: structuring, improvement, and dedupe.
//!
//! [`ContactModel`] bundles a [`TextGenerator`] with the three operations
//! that delegate judgment to the model. None of them inspects or mutates
//! contact content directly — all transformation happens in the model, and
//! all trust is withheld until the response parser's validation gate passes.
//!
//! The two fast paths (empty OCR text, dedupe of fewer than two entries) are
//! the only locally handled conditions; they avoid wasted network round
//! trips and are not errors.

use crate::contact::ContactBatch;
use crate::error::CardScanError;
use crate::pipeline::llm::{shared_generator, TextGenerator};
use crate::pipeline::parse;
use crate::prompts;
use std::sync::Arc;
use tracing::{debug, info};

/// Handle to the generative backend with contact-stage operations.
///
/// Cheap to clone; holds only the shared generator. Construct with a
/// substitute generator in tests, or via [`ContactModel::shared`] in
/// production.
#[derive(Clone)]
pub struct ContactModel {
    generator: Arc<dyn TextGenerator>,
}

impl ContactModel {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Bind to the process-wide lazily initialized client.
    pub fn shared() -> Result<Self, CardScanError> {
        let settings = crate::config::settings()?;
        Ok(Self::new(shared_generator(settings)?))
    }

    /// Structure raw OCR text into an initial contact batch.
    ///
    /// Content-free input returns an empty batch without a model call.
    pub async fn structure(&self, ocr_text: &str) -> Result<ContactBatch, CardScanError> {
        if ocr_text.trim().is_empty() {
            debug!("empty OCR text, skipping model call");
            return Ok(ContactBatch::default());
        }
        let prompt = prompts::structure_prompt(ocr_text);
        let output = self.generator.generate(&prompt).await?;
        parse::parse_batch(&output)
    }

    /// Refine an existing batch according to free-text instructions.
    ///
    /// Absent or blank instructions are passed to the model as the literal
    /// "None" marker, matching the refinement prompt's contract.
    pub async fn improve(
        &self,
        batch: &ContactBatch,
        instructions: Option<&str>,
    ) -> Result<ContactBatch, CardScanError> {
        let contacts_json = to_pretty_json(&batch.contacts)?;
        let guidance = instructions
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("None");
        let prompt = prompts::improve_prompt(&contacts_json, guidance);
        let output = self.generator.generate(&prompt).await?;
        parse::parse_batch(&output)
    }

    /// Merge true duplicates of the same person; never grows the batch.
    ///
    /// Fewer than two entries short-circuit unchanged (merging requires at
    /// least two candidates). The merge policy itself — name identity gates
    /// merging, shared contact info alone never does — is carried by the
    /// prompt; the stage enforces only the size guarantee, failing closed if
    /// the model invents contacts.
    pub async fn dedupe(&self, batch: ContactBatch) -> Result<ContactBatch, CardScanError> {
        if batch.len() < 2 {
            debug!(len = batch.len(), "nothing to merge, skipping model call");
            return Ok(batch);
        }
        let contacts_json = to_pretty_json(&batch.contacts)?;
        let prompt = prompts::dedupe_prompt(&contacts_json);
        let output = self.generator.generate(&prompt).await?;
        let merged = parse::parse_batch(&output)?;

        if merged.len() > batch.len() {
            return Err(CardScanError::schema(format!(
                "deduplication returned {} contacts for {} inputs",
                merged.len(),
                batch.len()
            )));
        }
        info!(before = batch.len(), after = merged.len(), "dedupe complete");
        Ok(merged)
    }
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, CardScanError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CardScanError::Internal(format!("batch serialization failed: {e}")))
}
