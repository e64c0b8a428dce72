use crate::presentation::handlers::ApiError;
use std::collections::HashMap;
use validator::{Validate, ValidationErrors};

/// Field name -> list of human-readable violation messages.
pub type FieldErrors = HashMap<String, Vec<String>>;

/// Runs the declarative rules on a deserialized payload. Failures become a
/// 400 with one map entry per offending field.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload
        .validate()
        .map_err(|errors| ApiError::Validation(flatten_errors(errors)))
}

fn flatten_errors(errors: ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, violations)| {
            let messages = violations
                .iter()
                .map(|v| {
                    v.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| v.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}
