//! Process configuration read from the environment.
//!
//! Every knob lives in one [`Settings`] struct so a run can be understood
//! from a single log line. Settings are read once on first demand and cached
//! for the process lifetime; nothing in the crate mutates them afterwards.
//!
//! | Variable                | Meaning                               | Default          |
//! |-------------------------|---------------------------------------|------------------|
//! | `GEMINI_API_KEY`        | Credentials for the default backend   | —                |
//! | `CARDSCAN_LLM_PROVIDER` | Override LLM provider name            | auto-detect      |
//! | `CARDSCAN_MODEL`        | Override model identifier             | gemini-2.0-flash |
//! | `CARDSCAN_OCR_PROVIDER` | OCR backend selector                  | `tesseract`      |
//! | `CARDSCAN_OCR_LANG`     | Tesseract language code               | `eng`            |
//! | `TESSERACT_CMD`         | Path to the tesseract binary          | resolve via PATH |

use crate::error::CardScanError;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::str::FromStr;

/// Which OCR backend handles text extraction.
///
/// Resolved once at startup from `CARDSCAN_OCR_PROVIDER`; an unknown name is
/// a configuration error (never retried), not a runtime fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrProviderKind {
    /// Local Tesseract CLI binding. (default)
    #[default]
    Tesseract,
}

impl FromStr for OcrProviderKind {
    type Err = CardScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tesseract" => Ok(OcrProviderKind::Tesseract),
            other => Err(CardScanError::UnsupportedOcrProvider {
                provider: other.to_string(),
            }),
        }
    }
}

/// Application settings, resolved from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// API key for the default Gemini backend.
    pub gemini_api_key: Option<String>,
    /// Explicit LLM provider name; `None` means auto-detect from API keys.
    pub llm_provider: Option<String>,
    /// Model identifier passed to the provider factory.
    pub model: Option<String>,
    /// Selected OCR backend.
    pub ocr_provider: OcrProviderKind,
    /// Tesseract language code, e.g. "eng" or "eng+deu".
    pub ocr_lang: String,
    /// Override path to the tesseract binary.
    pub tesseract_cmd: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            llm_provider: None,
            model: None,
            ocr_provider: OcrProviderKind::Tesseract,
            ocr_lang: "eng".to_string(),
            tesseract_cmd: None,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// Only the OCR provider name can fail here; missing credentials become
    /// an error at the point of first model use, not at startup, so purely
    /// OCR-side commands keep working without an API key.
    pub fn from_env() -> Result<Self, CardScanError> {
        let ocr_provider = match non_empty_var("CARDSCAN_OCR_PROVIDER") {
            Some(name) => name.parse()?,
            None => OcrProviderKind::Tesseract,
        };

        Ok(Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            llm_provider: non_empty_var("CARDSCAN_LLM_PROVIDER"),
            model: non_empty_var("CARDSCAN_MODEL"),
            ocr_provider,
            ocr_lang: non_empty_var("CARDSCAN_OCR_LANG").unwrap_or_else(|| "eng".to_string()),
            tesseract_cmd: non_empty_var("TESSERACT_CMD").map(PathBuf::from),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Process-wide cached settings.
///
/// The first caller reads the environment; everyone after that observes the
/// same snapshot. Callers that need a custom configuration (tests, embedders)
/// pass their own [`Settings`] to the `*_with` entry points instead.
pub fn settings() -> Result<&'static Settings, CardScanError> {
    SETTINGS.get_or_try_init(Settings::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let s = Settings::default();
        assert_eq!(s.ocr_provider, OcrProviderKind::Tesseract);
        assert_eq!(s.ocr_lang, "eng");
        assert!(s.gemini_api_key.is_none());
        assert!(s.tesseract_cmd.is_none());
    }

    #[test]
    fn ocr_provider_parses_case_insensitively() {
        assert_eq!(
            "Tesseract".parse::<OcrProviderKind>().unwrap(),
            OcrProviderKind::Tesseract
        );
    }

    #[test]
    fn unknown_ocr_provider_is_a_config_error() {
        let err = "easyocr".parse::<OcrProviderKind>().unwrap_err();
        assert!(matches!(
            err,
            CardScanError::UnsupportedOcrProvider { ref provider } if provider == "easyocr"
        ));
    }
}
