use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::prompts::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssue {
    MalformedBody,
    MissingText,
    TextNotString,
    BlankText,
}

impl ValidationIssue {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedBody => "request body is not a JSON object",
            Self::MissingText => "text field is missing",
            Self::TextNotString => "text field is not a string",
            Self::BlankText => "text is empty after trimming",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Configuration,
    Inference,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid request: {}", .0.as_str())]
    Validation(ValidationIssue),
    #[error("inference backend is not configured: {0}")]
    Configuration(String),
    #[error("{axis} classification failed: {message}")]
    Inference {
        axis: Classification,
        message: String,
    },
    #[error("{axis} completion {completion:?} is outside the expected answer grammar")]
    Normalization {
        axis: Classification,
        completion: String,
    },
    #[error("analysis exceeded its {0:?} deadline")]
    Deadline(Duration),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Inference { .. } | Self::Normalization { .. } | Self::Deadline(_) => {
                ErrorKind::Inference
            }
        }
    }

    /// HTTP status class for the boundary: 400 for caller mistakes, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Configuration | ErrorKind::Inference => 500,
        }
    }
}
