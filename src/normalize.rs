//! Tolerant extraction of the structured reply from model output
//!
//! The model is asked for a bare JSON object but nothing enforces it. Parsing
//! falls through three tiers, first success wins:
//!
//! 1. the whole text as a JSON object
//! 2. the span from the first `{` to the last `}` as a JSON object
//! 3. a fixed analysis plus the raw text (trimmed, capped) as treatment

use serde::Serialize;
use serde_json::{Map, Value};

/// Analysis used when no JSON object can be recovered
pub const FALLBACK_ANALYSIS: &str = "Could not parse structured analysis from the model output.";

/// Analysis used when the recovered object has no `analysis` key
pub const MISSING_ANALYSIS: &str = "Analysis not available.";

/// Treatment used when the recovered object has no `treatment` key
pub const MISSING_TREATMENT: &str = "Treatment not available.";

/// Maximum characters of raw text kept as the fallback treatment
pub const MAX_FALLBACK_CHARS: usize = 2000;

/// The two-field reply shown to the patient and read aloud
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredReply {
    pub analysis: String,
    pub treatment: String,
}

impl StructuredReply {
    /// Text handed to speech synthesis
    #[must_use]
    pub fn speech_text(&self) -> String {
        format!("{} {}", self.analysis, self.treatment)
    }
}

/// Convert arbitrary model output into a [`StructuredReply`]
///
/// Never fails. Keys must match exactly; extra keys are ignored.
#[must_use]
pub fn normalize(raw: &str) -> StructuredReply {
    if let Some(object) = parse_object(raw).or_else(|| brace_span(raw).and_then(parse_object)) {
        return from_object(&object);
    }

    tracing::debug!(raw_len = raw.len(), "model output is not JSON, using fallback");
    StructuredReply {
        analysis: FALLBACK_ANALYSIS.to_string(),
        treatment: raw.trim().chars().take(MAX_FALLBACK_CHARS).collect(),
    }
}

/// Parse text as a JSON object; other JSON values count as failure
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Inclusive span from the first `{` to the last `}` in the whole text
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn from_object(object: &Map<String, Value>) -> StructuredReply {
    StructuredReply {
        analysis: field(object, "analysis").unwrap_or_else(|| MISSING_ANALYSIS.to_string()),
        treatment: field(object, "treatment").unwrap_or_else(|| MISSING_TREATMENT.to_string()),
    }
}

/// Read a field as text; `null` counts as missing, non-strings render as JSON
fn field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_object_is_returned_unchanged() {
        let reply = normalize(r#"{"analysis": "With what I see, acne.", "treatment": "Wash twice daily."}"#);
        assert_eq!(reply.analysis, "With what I see, acne.");
        assert_eq!(reply.treatment, "Wash twice daily.");
    }

    #[test]
    fn surrounding_whitespace_still_parses_directly() {
        let reply = normalize("\n  {\"analysis\": \"a\", \"treatment\": \"t\"}  \n");
        assert_eq!(reply, StructuredReply { analysis: "a".into(), treatment: "t".into() });
    }

    #[test]
    fn object_wrapped_in_prose_is_extracted() {
        let raw = "Sure! Here is my answer:\n```json\n{\"analysis\": \"a\", \"treatment\": \"t\"}\n```\nTake care.";
        let reply = normalize(raw);
        assert_eq!(reply.analysis, "a");
        assert_eq!(reply.treatment, "t");
    }

    #[test]
    fn empty_input_uses_fallback_with_empty_treatment() {
        let reply = normalize("");
        assert_eq!(reply.analysis, FALLBACK_ANALYSIS);
        assert_eq!(reply.treatment, "");
    }

    #[test]
    fn prose_without_braces_is_kept_as_treatment() {
        let reply = normalize("   You should see a dermatologist.  ");
        assert_eq!(reply.analysis, FALLBACK_ANALYSIS);
        assert_eq!(reply.treatment, "You should see a dermatologist.");
    }

    #[test]
    fn unbalanced_braces_fall_through() {
        for raw in ["{\"analysis\": \"a\"", "} reversed {", "{", "}", "{{}"] {
            let reply = normalize(raw);
            assert_eq!(reply.analysis, FALLBACK_ANALYSIS, "input: {raw}");
            assert_eq!(reply.treatment, raw.trim(), "input: {raw}");
        }
    }

    #[test]
    fn fallback_treatment_is_capped() {
        let raw = "x".repeat(5000);
        let reply = normalize(&raw);
        assert_eq!(reply.analysis, FALLBACK_ANALYSIS);
        assert_eq!(reply.treatment.chars().count(), MAX_FALLBACK_CHARS);
    }

    #[test]
    fn cap_counts_characters_not_bytes() {
        let raw = "é".repeat(2500);
        let reply = normalize(&raw);
        assert_eq!(reply.treatment.chars().count(), MAX_FALLBACK_CHARS);
        assert_eq!(reply.treatment.len(), MAX_FALLBACK_CHARS * 2);
    }

    #[test]
    fn span_runs_from_first_open_to_last_close() {
        // The span reaches into the trailing `{ignored}`, which is not valid JSON
        let raw = r#"prefix {"analysis":"a","treatment":"t"} suffix {ignored}"#;
        let reply = normalize(raw);
        assert_eq!(reply.analysis, FALLBACK_ANALYSIS);
        assert_eq!(reply.treatment, raw);
    }

    #[test]
    fn span_parses_when_it_is_valid_on_its_own() {
        let raw = r#"prefix {"analysis":"a","treatment":"t"} suffix"#;
        let reply = normalize(raw);
        assert_eq!(reply.analysis, "a");
        assert_eq!(reply.treatment, "t");
    }

    #[test]
    fn missing_treatment_gets_default() {
        let reply = normalize(r#"{"analysis":"only this"}"#);
        assert_eq!(reply.analysis, "only this");
        assert_eq!(reply.treatment, MISSING_TREATMENT);
    }

    #[test]
    fn key_match_is_case_sensitive() {
        let reply = normalize(r#"{"Analysis":"a","TREATMENT":"t","extra":1}"#);
        assert_eq!(reply.analysis, MISSING_ANALYSIS);
        assert_eq!(reply.treatment, MISSING_TREATMENT);
    }

    #[test]
    fn nested_keys_do_not_count() {
        let reply = normalize(r#"{"result": {"analysis": "a", "treatment": "t"}}"#);
        assert_eq!(reply.analysis, MISSING_ANALYSIS);
        assert_eq!(reply.treatment, MISSING_TREATMENT);
    }

    #[test]
    fn non_object_json_is_not_accepted() {
        let reply = normalize("42");
        assert_eq!(reply.analysis, FALLBACK_ANALYSIS);
        assert_eq!(reply.treatment, "42");
    }

    #[test]
    fn non_string_values_render_as_json_text() {
        let reply = normalize(r#"{"analysis": null, "treatment": ["rest", "fluids"]}"#);
        assert_eq!(reply.analysis, MISSING_ANALYSIS);
        assert_eq!(reply.treatment, r#"["rest","fluids"]"#);
    }

    #[test]
    fn speech_text_joins_with_single_space() {
        let reply = StructuredReply { analysis: "A.".into(), treatment: "T.".into() };
        assert_eq!(reply.speech_text(), "A. T.");
    }
}
