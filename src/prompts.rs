//! Prompts for the model-driven stages.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the extraction guidance or the
//!    merge policy requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without
//!    calling a real model, so policy regressions (a dropped merge rule, a
//!    changed schema block) are caught cheaply.
//!
//! Every prompt states the exact contact JSON schema and forbids markdown or
//! commentary in the reply. The provider abstraction offers no JSON-typed
//! output mode, so the prompts carry the constraint and the response parser
//! enforces it.

/// The contact JSON schema block shared by all three prompts.
const SCHEMA_BLOCK: &str = r#"{
  "contacts": [
    {
      "name": string | null,
      "phone": string | null,
      "email": string | null,
      "company": string | null,
      "notes": string | null,
      "confidence": number | null,
      "extra": object | null
    }
  ]
}"#;

/// Instruction header for the structuring stage (OCR text → contacts).
pub const STRUCTURE_PROMPT: &str = r#"You are a contact card extraction assistant. Given OCR text, return ONLY valid JSON matching this schema:
{
  "contacts": [
    {
      "name": string | null,
      "phone": string | null,
      "email": string | null,
      "company": string | null,
      "notes": string | null,
      "confidence": number | null,
      "extra": object | null
    }
  ]
}
Guidelines:
- Do not include markdown or commentary.
- Normalize phone numbers to E.164 format when you are confident; otherwise leave as null.
- Provide confidence between 0 and 1 when possible.
- **INTELLIGENT INFERENCE**: Use context clues to infer job title, department, or role. If you see text like "VP", "Director", "Manager", "Engineer", extract to extra.job_title. If you see department names like "Sales", "Engineering", "HR", extract to extra.department.
- **CONTEXTUAL ENRICHMENT**: If company name suggests industry (e.g., "Tech Solutions" → tech industry), add extra.inferred_industry.
- Use the extra object for any remaining fields (e.g., job title, address, website, LinkedIn).

OCR text:
"#;

/// Build the full structuring prompt for a piece of OCR text.
pub fn structure_prompt(ocr_text: &str) -> String {
    format!("{STRUCTURE_PROMPT}{ocr_text}\n")
}

/// Build the refinement prompt for the improvement stage.
///
/// `contacts_json` is the existing batch serialised as JSON; `instructions`
/// is the caller's free-text guidance, already defaulted to the literal
/// "None" marker when absent.
pub fn improve_prompt(contacts_json: &str, instructions: &str) -> String {
    format!(
        r#"You are improving previously extracted contact data. Return ONLY valid JSON matching this exact schema:
{SCHEMA_BLOCK}

Existing contacts (JSON):
{contacts_json}

Additional guidance: {instructions}

Rules:
- Do not include markdown or commentary.
- Fix obvious OCR mistakes (e.g., "0" misread as "O", "1" as "l").
- **SMART INFERENCE**: Infer missing job title, department, or industry from context. Look for professional titles, company type, or role indicators.
- **ENRICHMENT**: If you can deduce additional info (social media handles, website from email domain), add to extra object.
- Keep phone/email formatting consistent.
- Preserve any notes or extra data if still relevant.
- MUST wrap the array in a "contacts" field.
"#
    )
}

/// Build the merge-policy prompt for the dedupe stage.
///
/// The policy is a precedence rule: name identity gates merging, and shared
/// contact info alone never triggers it. The examples in the prompt are the
/// contract any replacement decision procedure must reproduce.
pub fn dedupe_prompt(contacts_json: &str) -> String {
    format!(
        r#"You are a contact deduplication expert. Analyze the contacts and merge ONLY true duplicates of the same person.

Contacts (JSON):
{contacts_json}

CRITICAL RULES:

1. **SAME PERSON - MUST MERGE if ALL of these are true:**
   - Same name (exact or very close variation like "John Smith" vs "J. Smith")
   - AND same phone number OR same email

2. **DIFFERENT PEOPLE - DO NOT MERGE even if they share contact info:**
   - Different names with same phone/email = DIFFERENT people from same company/household
   - Example: "Olivia Wilson" and "Mariana Anderson" with same email = 2 SEPARATE contacts (coworkers sharing company contact)
   - Example: "John Smith" and "Jane Smith" with same phone = 2 SEPARATE contacts (family/household)

3. **MERGING STRATEGY (only when merging same person):**
   - Take the MOST COMPLETE value for each field
   - Combine all unique extra fields (job_title, address, website, etc.)
   - Use the HIGHEST confidence score
   - Do NOT add any merge notes

4. **EXAMPLES:**
   - MERGE: "John Smith" (+11234567890) + "John Smith" (+11234567890) because same person
   - MERGE: "John Smith" (john@acme.com) + "J. Smith" (john@acme.com) because same person, name variation
   - DON'T MERGE: "Olivia Wilson" (hello@company.com) + "Mariana Anderson" (hello@company.com) because different people, same company email
   - DON'T MERGE: "John Smith" (+1234567890) + "Jane Smith" (+1234567890) because different people, shared phone

BE CAREFUL: Shared contact information does NOT mean same person. You MUST check the NAME first.

Return ONLY valid JSON matching this schema:
{SCHEMA_BLOCK}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_prompt_embeds_ocr_text_last() {
        let p = structure_prompt("ACME Corp\nJohn Smith");
        assert!(p.starts_with("You are a contact card extraction assistant"));
        assert!(p.ends_with("ACME Corp\nJohn Smith\n"));
        assert!(p.contains("\"contacts\""));
    }

    #[test]
    fn improve_prompt_defaults_are_visible() {
        let p = improve_prompt("[]", "None");
        assert!(p.contains("Additional guidance: None"));
        assert!(p.contains("MUST wrap the array in a \"contacts\" field"));
    }

    #[test]
    fn dedupe_prompt_states_the_gating_rule() {
        let p = dedupe_prompt("[]");
        // The name-identity gate and both counter-examples must survive any
        // future prompt edits.
        assert!(p.contains("You MUST check the NAME first"));
        assert!(p.contains("Olivia Wilson"));
        assert!(p.contains("Jane Smith"));
        assert!(p.contains("HIGHEST confidence"));
    }

    #[test]
    fn all_prompts_forbid_markdown() {
        for p in [
            structure_prompt("x"),
            improve_prompt("[]", "None"),
            dedupe_prompt("[]"),
        ] {
            assert!(
                p.contains("Do not include markdown") || p.contains("ONLY valid JSON"),
                "prompt lost its output-format constraint"
            );
        }
    }
}
