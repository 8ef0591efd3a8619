//! Contact data model.
//!
//! [`Contact`] mirrors the JSON shape the model is prompted to produce, and
//! the shape the pipeline returns to callers:
//!
//! ```text
//! { "contacts": [
//!   { "name": string|null, "phone": string|null, "email": string|null,
//!     "company": string|null, "notes": string|null,
//!     "confidence": number|null (0..1), "extra": object|null }
//! ] }
//! ```
//!
//! Every field is independently nullable — an OCR pass over a blurry card
//! legitimately yields partial records. `extra` is an open-ended map (job
//! title, department, inferred industry, social handles, …) whose keys are
//! not predeclared; schema validation only constrains `confidence`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CardScanError;

/// A structured record of one person's identifying and contact information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Model- or OCR-derived certainty in `[0, 1]`.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Open-ended extension map, accepted as-is when schema-valid.
    #[serde(default)]
    pub extra: Option<Map<String, Value>>,
}

impl Contact {
    /// True when every field is null — valid per the schema but meaningless.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.company.is_none()
            && self.notes.is_none()
            && self.confidence.is_none()
            && self.extra.is_none()
    }
}

/// An ordered batch of contacts; the unit exchanged with the improvement and
/// dedupe stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactBatch {
    // Deliberately not defaulted: a reply without the "contacts" key is a
    // schema violation, not an empty batch.
    pub contacts: Vec<Contact>,
}

impl ContactBatch {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Schema validation beyond what serde can express: `confidence` must
    /// lie in `[0, 1]` inclusive when present.
    pub fn validate(&self) -> Result<(), CardScanError> {
        for (i, contact) in self.contacts.iter().enumerate() {
            if let Some(c) = contact.confidence {
                if !(0.0..=1.0).contains(&c) || c.is_nan() {
                    return Err(CardScanError::schema(format!(
                        "contact {i}: confidence {c} is outside [0, 1]"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<Contact>> for ContactBatch {
    fn from(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_null_contact_is_valid_and_empty() {
        let c = Contact::default();
        assert!(c.is_empty());
        assert!(ContactBatch::new(vec![c]).validate().is_ok());
    }

    #[test]
    fn confidence_bounds_are_inclusive() {
        let batch = ContactBatch::new(vec![
            Contact {
                confidence: Some(0.0),
                ..Default::default()
            },
            Contact {
                confidence: Some(1.0),
                ..Default::default()
            },
        ]);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let batch = ContactBatch::new(vec![Contact {
            confidence: Some(1.5),
            ..Default::default()
        }]);
        let err = batch.validate().unwrap_err();
        assert!(matches!(err, CardScanError::SchemaViolation { .. }));
    }

    #[test]
    fn serialises_nulls_explicitly() {
        // The model prompt states every field, null included; keep the
        // pipeline's own output symmetric with that schema.
        let v = serde_json::to_value(Contact {
            name: Some("Ada".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(v["name"], json!("Ada"));
        assert!(v.as_object().unwrap().contains_key("phone"));
        assert_eq!(v["phone"], Value::Null);
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let c: Contact = serde_json::from_value(json!({"name": "Ada"})).unwrap();
        assert_eq!(c.name.as_deref(), Some("Ada"));
        assert!(c.extra.is_none());
    }
}
