//! Field normalization: canonicalize phone and email strings.
//!
//! Pure and infallible — the worst case is returning the input unchanged.
//! Normalization is a lossy canonicalization toward an E.164-like shape, not
//! validation: it never verifies that a country code exists or that an email
//! domain resolves. Values it cannot confidently canonicalize pass through
//! untouched so a human (or the improvement stage) can review them later.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").unwrap());

/// Canonicalize a phone string toward `+<digits>`.
///
/// Strips every non-digit character; fewer than 7 remaining digits is
/// treated as not-a-phone-number and the raw value passes through. A single
/// leading trunk "0" is dropped before prefixing "+".
pub fn normalize_phone(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    let digits = RE_NON_DIGIT.replace_all(raw, "");
    if digits.len() < 7 {
        return Some(raw.to_string());
    }
    let digits = digits.strip_prefix('0').unwrap_or(&digits);
    Some(format!("+{digits}"))
}

/// Canonicalize an email string: trim and lowercase.
///
/// A value without "@" is left unchanged for downstream review rather than
/// being mangled into something that merely looks cleaner.
pub fn normalize_email(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    let value = raw.trim().to_lowercase();
    if !value.contains('@') {
        return Some(raw.to_string());
    }
    Some(value)
}
