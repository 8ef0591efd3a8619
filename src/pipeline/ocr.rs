//! Text extraction: image bytes → raw text plus a scalar confidence.
//!
//! ## Why spawn_blocking?
//!
//! The tesseract binding shells out to the Tesseract CLI and blocks on
//! CPU-bound recognition. [`run_ocr`] moves that work onto tokio's blocking
//! pool so concurrent pipeline invocations keep their worker threads
//! responsive.
//!
//! ## Confidence aggregation
//!
//! Tesseract reports per-word confidences on a 0–100 scale, using negative
//! values for non-word layout entries. The aggregate is the mean of the
//! non-negative values scaled to `[0, 1]`, clamped, and rounded to four
//! decimal places; an image with no recognized words scores 0.0.

use crate::config::{OcrProviderKind, Settings};
use crate::error::CardScanError;
use rusty_tesseract::{Args, Image as TessImage, TessError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Raw OCR output for one image: extracted text and aggregate certainty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrResult {
    /// Recognized text, trimmed of leading/trailing whitespace.
    pub text: String,
    /// Mean per-word confidence in `[0, 1]`, rounded to 4 decimal places.
    pub confidence: f64,
}

/// Capability set of an OCR backend. Blocking by contract; call through
/// [`run_ocr`] from async contexts.
pub trait OcrEngine: Send + Sync {
    fn extract(&self, image_bytes: &[u8]) -> Result<OcrResult, CardScanError>;
}

/// Local Tesseract CLI backend.
pub struct TesseractEngine {
    lang: String,
    tesseract_cmd: Option<PathBuf>,
}

impl TesseractEngine {
    pub fn new(lang: impl Into<String>, tesseract_cmd: Option<PathBuf>) -> Self {
        Self {
            lang: lang.into(),
            tesseract_cmd,
        }
    }

    fn args(&self) -> Args {
        Args {
            lang: self.lang.clone(),
            ..Args::default()
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn extract(&self, image_bytes: &[u8]) -> Result<OcrResult, CardScanError> {
        let decoded = image::load_from_memory(image_bytes).map_err(|e| {
            CardScanError::UnreadableImage {
                detail: e.to_string(),
            }
        })?;

        // The binding resolves `tesseract` from PATH; a configured override
        // acts as a preflight so a bad TESSERACT_CMD surfaces as a
        // configuration error instead of a cryptic recognition failure.
        if let Some(cmd) = &self.tesseract_cmd {
            if !cmd.exists() {
                return Err(CardScanError::OcrUnavailable {
                    detail: format!("TESSERACT_CMD points to '{}'", cmd.display()),
                });
            }
        }

        // Fixed color space before recognition; Tesseract's grayscale pass
        // behaves consistently from RGB8 regardless of source format. The
        // CLI binding wants a file path, so the normalized frame goes through
        // a managed tempfile that is cleaned up on return or panic.
        let rgb = decoded.to_rgb8();
        let tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| CardScanError::Internal(format!("tempfile: {e}")))?;
        rgb.save_with_format(tmp.path(), image::ImageFormat::Png)
            .map_err(|e| CardScanError::Internal(format!("tempfile write: {e}")))?;
        let tess_image = TessImage::from_path(tmp.path()).map_err(map_tess_error)?;
        let args = self.args();

        let text = rusty_tesseract::image_to_string(&tess_image, &args).map_err(map_tess_error)?;

        // Independent per-word confidence pass; recognition text and
        // confidences come from separate tesseract invocations.
        let data = rusty_tesseract::image_to_data(&tess_image, &args).map_err(map_tess_error)?;
        let confidences: Vec<f64> = data
            .data
            .iter()
            .map(|word| f64::from(word.conf))
            .filter(|conf| *conf >= 0.0)
            .collect();
        let confidence = aggregate_confidence(&confidences);

        debug!(
            words = confidences.len(),
            confidence, "tesseract extraction complete"
        );

        Ok(OcrResult {
            text: text.trim().to_string(),
            confidence,
        })
    }
}

/// Mean of 0–100 confidences scaled to `[0, 1]`, clamped, rounded to 4 dp.
fn aggregate_confidence(confidences: &[f64]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    let mean = confidences.iter().sum::<f64>() / confidences.len() as f64 / 100.0;
    (mean.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0
}

fn map_tess_error(e: TessError) -> CardScanError {
    let detail = format!("{e:?}");
    if detail.contains("TesseractNotFound") {
        CardScanError::OcrUnavailable { detail }
    } else {
        CardScanError::OcrFailed { detail }
    }
}

/// Select the configured OCR backend.
///
/// Variants are resolved once at startup from an explicit enum, never by
/// runtime type inspection; an unsupported name already failed during
/// settings parsing.
pub fn engine_from_settings(settings: &Settings) -> Arc<dyn OcrEngine> {
    match settings.ocr_provider {
        OcrProviderKind::Tesseract => Arc::new(TesseractEngine::new(
            settings.ocr_lang.clone(),
            settings.tesseract_cmd.clone(),
        )),
    }
}

/// Run the engine on tokio's blocking pool.
pub async fn run_ocr(
    engine: Arc<dyn OcrEngine>,
    image_bytes: Vec<u8>,
) -> Result<OcrResult, CardScanError> {
    tokio::task::spawn_blocking(move || engine.extract(&image_bytes))
        .await
        .map_err(|e| CardScanError::Internal(format!("OCR task panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_empty_is_zero() {
        assert_eq!(aggregate_confidence(&[]), 0.0);
    }

    #[test]
    fn aggregate_scales_and_rounds() {
        // (80 + 90 + 100) / 3 = 90 → 0.9
        assert_eq!(aggregate_confidence(&[80.0, 90.0, 100.0]), 0.9);
        // 66.666 % → rounds at the 4th decimal place
        assert_eq!(aggregate_confidence(&[66.666]), 0.6667);
    }

    #[test]
    fn aggregate_clamps_out_of_range_reports() {
        assert_eq!(aggregate_confidence(&[250.0]), 1.0);
    }

    #[test]
    fn undecodable_bytes_are_a_client_error() {
        let engine = TesseractEngine::new("eng", None);
        let err = engine.extract(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CardScanError::UnreadableImage { .. }));
    }

    #[test]
    fn settings_select_tesseract() {
        let settings = Settings::default();
        // Factory must not panic and must produce a usable engine handle.
        let _engine = engine_from_settings(&settings);
    }
}
