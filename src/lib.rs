//! # cardscan
//!
//! Turn a photographed or scanned business-card image into structured
//! contact records, then refine or deduplicate batches of such records.
//!
//! ## Why this crate?
//!
//! Business cards defeat naive OCR-to-fields mapping: layouts vary wildly,
//! job titles and departments hide in context, and neither the OCR engine
//! nor a generative model is reliable on its own. This crate tolerates both
//! unreliable producers — free text from Tesseract, free text from an LLM —
//! and still yields a validated, typed result, failing closed whenever the
//! model's output cannot be coerced into the contact schema.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image bytes
//!  │
//!  ├─ 1. OCR        tesseract text + per-word confidence (spawn_blocking)
//!  ├─ 2. Structure  extraction prompt → LLM → contacts JSON
//!  ├─ 3. Parse      fence-strip, then strict schema validation
//!  └─ 4. Normalize  phone → +digits, email → lowercase; default confidence
//! ```
//!
//! Two further operations work on previously produced batches:
//! **improve** (free-text refinement instructions) and **dedupe** (merge
//! true duplicates of the same person — name identity gates merging; shared
//! phone or email alone never does, so coworkers on one inbox stay separate).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardscan::extract;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Backend resolved from GEMINI_API_KEY (default: gemini-2.0-flash)
//!     let bytes = std::fs::read("card.png")?;
//!     let output = extract(bytes).await?;
//!     for contact in &output.contacts.contacts {
//!         println!("{:?}", contact.name);
//!     }
//!     eprintln!("ocr confidence: {}", output.meta.ocr_confidence);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cardscan` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod contact;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod stages;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrProviderKind, Settings};
pub use contact::{Contact, ContactBatch};
pub use error::CardScanError;
pub use extract::{extract, extract_sync, extract_with, ExtractionMeta, ExtractionOutput};
pub use pipeline::llm::{ProviderGenerator, TextGenerator};
pub use pipeline::ocr::{OcrEngine, OcrResult, TesseractEngine};
pub use stages::ContactModel;
pub use store::{ContactStore, StoredContact};
