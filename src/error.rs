use thiserror::Error;

#[derive(Error, Debug)]
pub enum CallCenterError {
    #[error("API Error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("JSON Error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Unknown field type '{0}'")]
    UnknownFieldType(String),

    #[error("Duplicate field name '{0}'")]
    DuplicateField(String),

    #[error("Template '{template}' requires a value for '{{{placeholder}}}'")]
    MissingPlaceholder { template: String, placeholder: String },

    #[error("Template '{template}' is malformed: {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid record: {}", describe_violations(.0))]
    InvalidRecord(Vec<FieldViolation>),

    #[error("Translation Failed: {0}")]
    TranslationFailed(String),

    #[error("Generation Failed: {0}")]
    GenerationFailed(String),
}

/// One field of an extraction payload that did not pass its rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

fn describe_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, CallCenterError>;
