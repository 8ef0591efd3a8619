//! Pipeline building blocks for contact extraction.
//!
//! Each submodule implements exactly one transformation step, keeping every
//! stage independently testable and letting a backend be swapped without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! image ──▶ ocr ──▶ [structure] ──▶ parse ──▶ normalize
//! (bytes)  (tesseract)  (LLM)     (validate)  (phone/email)
//! ```
//!
//! 1. [`ocr`]       — decode the image and recover raw text plus a
//!    confidence score; CPU-bound, runs via `spawn_blocking`
//! 2. [`llm`]       — the generator seam and shared model client; the only
//!    module with network I/O
//! 3. [`parse`]     — coerce free model output into the validated contact
//!    schema, failing closed on anything malformed
//! 4. [`normalize`] — deterministic phone/email canonicalization
//!
//! The model-driven stages themselves (structure, improve, dedupe) live in
//! [`crate::stages`]; the end-to-end composition lives in [`crate::extract`].

pub mod llm;
pub mod normalize;
pub mod ocr;
pub mod parse;
