use serde_json::Value;

use crate::error::{AnalysisError, ValidationIssue};
use crate::models::AnalysisRequest;

/// Extracts `text` from a raw JSON request body.
pub fn validate_body(body: &[u8]) -> Result<AnalysisRequest, AnalysisError> {
    let parsed: Value = serde_json::from_slice(body)
        .map_err(|_| AnalysisError::Validation(ValidationIssue::MalformedBody))?;
    validate_value(&parsed)
}

pub fn validate_value(body: &Value) -> Result<AnalysisRequest, AnalysisError> {
    let object = body
        .as_object()
        .ok_or(AnalysisError::Validation(ValidationIssue::MalformedBody))?;

    let text = match object.get("text") {
        None | Some(Value::Null) => {
            return Err(AnalysisError::Validation(ValidationIssue::MissingText))
        }
        Some(Value::String(text)) => text,
        Some(_) => return Err(AnalysisError::Validation(ValidationIssue::TextNotString)),
    };

    AnalysisRequest::new(text).ok_or(AnalysisError::Validation(ValidationIssue::BlankText))
}
