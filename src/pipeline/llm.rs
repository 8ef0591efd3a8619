//! Model plumbing: the generator seam and the process-wide shared client.
//!
//! Stages never talk to a concrete LLM SDK. They hold an
//! `Arc<dyn TextGenerator>` — a narrow prompt-in/text-out seam — so tests can
//! substitute scripted generators without any network or credentials.
//! [`ProviderGenerator`] is the production implementation, backed by an
//! `edgequake_llm` provider.
//!
//! The shared client is constructed exactly once on first demand and is
//! immutable afterwards. A single [`OnceCell`] guards initialization: the
//! first caller constructs it, concurrent first-users observe the same
//! instance, and a failed construction (missing credentials) is not cached,
//! so fixing the environment does not require a restart of callers that
//! never got a client.

use crate::config::Settings;
use crate::error::CardScanError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use futures::FutureExt;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::debug;

/// Default model when none is configured; matches the original deployment
/// target of this pipeline.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Near-zero temperature: extraction should transcribe and restructure, not
/// invent. Plenty of headroom for large batches in the token cap.
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: usize = 4096;

/// Prompt-in/text-out capability of a generative backend.
///
/// Object-safe via [`BoxFuture`]; implementations must be stateless per call
/// so one instance can serve many concurrent logical operations.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, CardScanError>>;
}

/// Production [`TextGenerator`] backed by an `edgequake_llm` provider.
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

fn completion_options() -> CompletionOptions {
    CompletionOptions {
        temperature: Some(TEMPERATURE),
        max_tokens: Some(MAX_TOKENS),
        ..Default::default()
    }
}

impl TextGenerator for ProviderGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, CardScanError>> {
        async move {
            let messages = vec![ChatMessage::user(prompt)];
            let options = completion_options();

            let response = self
                .provider
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| CardScanError::ModelApiError {
                    message: e.to_string(),
                })?;

            debug!(
                prompt_tokens = response.prompt_tokens,
                completion_tokens = response.completion_tokens,
                "model call complete"
            );

            if response.content.trim().is_empty() {
                return Err(CardScanError::ModelApiError {
                    message: "response did not contain text output".to_string(),
                });
            }
            Ok(response.content)
        }
        .boxed()
    }
}

/// Resolve an LLM provider from settings, most-specific first:
/// explicit provider name, then the Gemini default when its key is present,
/// then full auto-detection from the environment.
fn resolve_provider(settings: &Settings) -> Result<Arc<dyn LLMProvider>, CardScanError> {
    let model = settings.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(name) = &settings.llm_provider {
        return ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            CardScanError::ModelUnconfigured {
                hint: format!("Provider '{name}' could not be created: {e}"),
            }
        });
    }

    if settings.gemini_api_key.is_some() {
        return ProviderFactory::create_llm_provider("gemini", model).map_err(|e| {
            CardScanError::ModelUnconfigured {
                hint: format!("Gemini provider could not be created: {e}"),
            }
        });
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| CardScanError::ModelUnconfigured {
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                 Set GEMINI_API_KEY, or set CARDSCAN_LLM_PROVIDER and its API key.\n\
                 Error: {e}"
            ),
        })?;
    Ok(provider)
}

static SHARED_GENERATOR: OnceCell<Arc<dyn TextGenerator>> = OnceCell::new();

/// The process-wide lazily initialized generator.
pub fn shared_generator(settings: &Settings) -> Result<Arc<dyn TextGenerator>, CardScanError> {
    SHARED_GENERATOR
        .get_or_try_init(|| {
            let provider = resolve_provider(settings)?;
            Ok(Arc::new(ProviderGenerator::new(provider)) as Arc<dyn TextGenerator>)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_options_are_deterministic() {
        let opts = completion_options();
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }
}
