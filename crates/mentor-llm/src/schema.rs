//! The structured answer every tutoring reply is constrained to.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use mentor_core::types::BulletPoint;

use crate::error::LlmError;

/// Name under which the schema is registered with the provider.
pub const SCHEMA_NAME: &str = "tutor_answer";

/// A step-by-step answer: the bullet points plus a one-line conclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredAnswer {
    pub steps: Vec<BulletPoint>,
    pub final_answer: String,
}

/// JSON schema sent with every structured request.
///
/// Strict mode requires every property to be listed as required and
/// `additionalProperties` to be false at every level.
pub fn answer_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "steps": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "heading": { "type": "string" },
                        "explanation": { "type": "string" },
                        "output": { "type": "string" }
                    },
                    "required": ["heading", "explanation", "output"],
                    "additionalProperties": false
                }
            },
            "final_answer": { "type": "string" }
        },
        "required": ["steps", "final_answer"],
        "additionalProperties": false
    })
}

/// The `response_format` block requesting schema-constrained output.
pub fn response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": SCHEMA_NAME,
            "strict": true,
            "schema": answer_schema()
        }
    })
}

/// Parse a provider payload into a [`StructuredAnswer`].
///
/// Fails on invalid JSON and on any deviation from the schema (missing,
/// extra, or mistyped fields).
pub fn parse_structured(content: &str) -> Result<StructuredAnswer, LlmError> {
    serde_json::from_str(content.trim()).map_err(|e| LlmError::Schema(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_answer() {
        let raw = r#"{
            "steps": [
                {"heading": "Step 1", "explanation": "e1", "output": "o1"},
                {"heading": "Step 2", "explanation": "e2", "output": "o2"}
            ],
            "final_answer": "A"
        }"#;
        let answer = parse_structured(raw).unwrap();
        assert_eq!(answer.steps.len(), 2);
        assert_eq!(answer.steps[1].explanation, "e2");
        assert_eq!(answer.final_answer, "A");
    }

    #[test]
    fn test_parse_empty_steps_is_valid() {
        let answer = parse_structured(r#"{"steps": [], "final_answer": "42"}"#).unwrap();
        assert!(answer.steps.is_empty());
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = parse_structured("The answer is 42.").unwrap_err();
        assert!(matches!(err, LlmError::Schema(_)));
    }

    #[test]
    fn test_parse_rejects_missing_final_answer() {
        let err = parse_structured(r#"{"steps": []}"#).unwrap_err();
        assert!(err.to_string().contains("final_answer"));
    }

    #[test]
    fn test_parse_rejects_incomplete_step() {
        let raw = r#"{"steps": [{"heading": "h", "explanation": "e"}], "final_answer": "A"}"#;
        assert!(parse_structured(raw).is_err());
    }

    #[test]
    fn test_parse_rejects_extra_fields() {
        let raw = r#"{"steps": [], "final_answer": "A", "illustrationUrl": "x"}"#;
        assert!(parse_structured(raw).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        assert!(parse_structured(r#"{"steps": "none", "final_answer": "A"}"#).is_err());
        assert!(parse_structured(r#"{"steps": [], "final_answer": 42}"#).is_err());
    }

    #[test]
    fn test_schema_is_strict() {
        let schema = answer_schema();
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"], json!(["steps", "final_answer"]));
        let item = &schema["properties"]["steps"]["items"];
        assert_eq!(item["additionalProperties"], false);
        assert_eq!(item["required"], json!(["heading", "explanation", "output"]));
    }

    #[test]
    fn test_response_format_wraps_schema() {
        let format = response_format();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], SCHEMA_NAME);
        assert_eq!(format["json_schema"]["strict"], true);
        assert_eq!(format["json_schema"]["schema"], answer_schema());
    }
}
