use thiserror::Error;

/// Raised when a probe snapshot does not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {path}")]
    MissingField { path: String },

    #[error("field {path} must be {expected}")]
    WrongType { path: String, expected: &'static str },

    #[error("invalid snapshot json: {0}")]
    Json(String),
}

impl ValidationError {
    pub fn missing(path: impl Into<String>) -> Self {
        Self::MissingField { path: path.into() }
    }

    pub fn wrong_type(path: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            path: path.into(),
            expected,
        }
    }
}
