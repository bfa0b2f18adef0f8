use crate::error::ValidationError;
use serde_json::Value;
use validator::Validate;

/// A structurally valid animal submission, ready for the record store.
///
/// Values are kept exactly as sent: no trimming, no case folding.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct AnimalSubmission {
    #[validate(length(max = 100))]
    pub job_id: String,
    #[validate(length(max = 100))]
    pub name: String,
    #[validate(length(max = 50))]
    pub generation: String,
}

/// Wire name, struct field name, and maximum length in characters.
/// Order decides which violation is reported when several fields are too long.
const FIELD_LIMITS: [(&str, &str, u64); 3] = [
    ("jobId", "job_id", 100),
    ("name", "name", 100),
    ("generation", "generation", 50),
];

/// Request validation utilities
pub struct RequestValidator;

impl RequestValidator {
    /// Extracts and validates the `animal` object of a submission body
    pub fn validate_submit_body(body: &Value) -> Result<AnimalSubmission, ValidationError> {
        let animal = body
            .get("animal")
            .filter(|v| !v.is_null())
            .ok_or(ValidationError::Missing("animal"))?;

        Self::validate_candidate(animal)
    }

    /// Validates a single candidate record
    pub fn validate_candidate(candidate: &Value) -> Result<AnimalSubmission, ValidationError> {
        if !candidate.is_object() {
            return Err(ValidationError::Malformed(
                "'animal' must be an object".to_string(),
            ));
        }

        let submission = AnimalSubmission {
            job_id: required_string(candidate, "jobId")?,
            name: required_string(candidate, "name")?,
            generation: required_string(candidate, "generation")?,
        };

        if let Err(errors) = submission.validate() {
            let failed = errors.field_errors();
            let (field, _, max) = FIELD_LIMITS
                .iter()
                .find(|(_, struct_field, _)| failed.contains_key(*struct_field))
                .copied()
                .unwrap_or(FIELD_LIMITS[0]);
            return Err(ValidationError::TooLong { field, max });
        }

        Ok(submission)
    }
}

/// True when `candidate` would be accepted by [`RequestValidator::validate_candidate`]
pub fn validate(candidate: &Value) -> bool {
    RequestValidator::validate_candidate(candidate).is_ok()
}

// An empty string counts as absent.
fn required_string(candidate: &Value, field: &'static str) -> Result<String, ValidationError> {
    match candidate.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Missing(field)),
        Some(Value::String(s)) if s.is_empty() => Err(ValidationError::Missing(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::NotAString(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(name: &str) -> Value {
        json!({ "jobId": "j1", "name": name, "generation": "g1" })
    }

    #[test]
    fn test_valid_candidate() {
        let submission = RequestValidator::validate_candidate(&candidate("Rex")).unwrap();
        assert_eq!(submission.job_id, "j1");
        assert_eq!(submission.name, "Rex");
        assert_eq!(submission.generation, "g1");
    }

    #[test]
    fn test_name_length_boundary() {
        assert!(validate(&candidate(&"a".repeat(100))));
        assert!(!validate(&candidate(&"a".repeat(101))));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 100 two-byte characters
        assert!(validate(&candidate(&"é".repeat(100))));
    }

    #[test]
    fn test_generation_limit() {
        let ok = json!({ "jobId": "j1", "name": "Rex", "generation": "g".repeat(50) });
        let too_long = json!({ "jobId": "j1", "name": "Rex", "generation": "g".repeat(51) });

        assert!(validate(&ok));
        assert_eq!(
            RequestValidator::validate_candidate(&too_long),
            Err(ValidationError::TooLong { field: "generation", max: 50 })
        );
    }

    #[test]
    fn test_job_id_limit() {
        let too_long = json!({ "jobId": "j".repeat(101), "name": "Rex", "generation": "g1" });
        assert_eq!(
            RequestValidator::validate_candidate(&too_long),
            Err(ValidationError::TooLong { field: "jobId", max: 100 })
        );
    }

    #[test]
    fn test_missing_and_mistyped_fields() {
        assert_eq!(
            RequestValidator::validate_candidate(&json!({ "name": "Rex", "generation": "g1" })),
            Err(ValidationError::Missing("jobId"))
        );
        assert_eq!(
            RequestValidator::validate_candidate(&json!({ "jobId": "j1", "name": 7, "generation": "g1" })),
            Err(ValidationError::NotAString("name"))
        );
        assert_eq!(
            RequestValidator::validate_candidate(&json!({ "jobId": "j1", "name": "", "generation": "g1" })),
            Err(ValidationError::Missing("name"))
        );
        assert!(!validate(&json!("Rex")));
    }

    #[test]
    fn test_no_normalization() {
        let submission =
            RequestValidator::validate_candidate(&candidate("  Rex  ")).unwrap();
        assert_eq!(submission.name, "  Rex  ");
    }

    #[test]
    fn test_submit_body_requires_animal() {
        assert_eq!(
            RequestValidator::validate_submit_body(&json!({})),
            Err(ValidationError::Missing("animal"))
        );
        assert!(RequestValidator::validate_submit_body(&json!({ "animal": candidate("Rex") })).is_ok());
    }
}
