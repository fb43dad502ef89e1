//! Error types for naming validation, configuration and topology.

use thiserror::Error;

use crate::topology::TopologyError;

/// Error codes for mesh part naming validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// N001: Part name carries no recognized region token
    UnrecognizedPartName,
    /// N002: Part name carries more than one region token
    AmbiguousPartName,
    /// N003: Two parts claim the same region
    DuplicateRegion,
    /// N004: No parts to validate
    NoParts,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "N001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::UnrecognizedPartName => "N001",
            ErrorCode::AmbiguousPartName => "N002",
            ErrorCode::DuplicateRegion => "N003",
            ErrorCode::NoParts => "N004",
        }
    }

    /// Whether the user may override this error and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorCode::UnrecognizedPartName)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A naming diagnostic with code, message and the offending part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Name of the part the error refers to.
    pub part: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            part: None,
        }
    }

    /// Creates a new validation error for a specific part.
    pub fn for_part(code: ErrorCode, message: impl Into<String>, part: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            part: Some(part.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref part) = self.part {
            write!(f, "{}: {} ({})", self.code, self.message, part)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of naming validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if every error can be overridden by the user.
    pub fn is_recoverable(&self) -> bool {
        self.errors.iter().all(|e| e.code.is_recoverable())
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Top-level error type for configuration and topology operations.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Configuration failed validation.
    #[error("invalid rig config: {0}")]
    InvalidConfig(String),

    /// Topology violates the forest invariants.
    #[error("invalid topology: {0}")]
    Topology(#[from] TopologyError),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A wildcard name pattern failed to compile.
    #[error("invalid name pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Common trait for errors raised by a pipeline stage.
///
/// Gives every fatal error a stable code and the stage it came from, so the
/// confirmation collaborator can show which precondition failed where.
pub trait StageError: std::error::Error {
    /// Get the error code for reporting (e.g. "RIG_001").
    fn code(&self) -> &'static str;

    /// Get a human-readable message describing the error.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Get the stage that raised the error ("skeleton", "controls", ...).
    fn category(&self) -> &'static str;
}

impl StageError for SpecError {
    fn code(&self) -> &'static str {
        match self {
            SpecError::InvalidConfig(_) => "SPEC_001",
            SpecError::Topology(_) => "SPEC_002",
            SpecError::JsonParse(_) => "SPEC_003",
            SpecError::Io(_) => "SPEC_004",
            SpecError::InvalidPattern { .. } => "SPEC_005",
        }
    }

    fn category(&self) -> &'static str {
        "config"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::for_part(
            ErrorCode::UnrecognizedPartName,
            "no body region token",
            "Char_Tail",
        );
        assert_eq!(err.to_string(), "N001: no body region token (Char_Tail)");
    }

    #[test]
    fn test_recoverability() {
        let mut result = ValidationResult::default();
        assert!(result.is_ok());
        result.add_error(ValidationError::new(ErrorCode::UnrecognizedPartName, "x"));
        assert!(!result.is_ok());
        assert!(result.is_recoverable());
        result.add_error(ValidationError::new(ErrorCode::AmbiguousPartName, "y"));
        assert!(!result.is_recoverable());
    }

    #[test]
    fn test_spec_error_codes() {
        let err = SpecError::InvalidConfig("bad".into());
        assert_eq!(err.code(), "SPEC_001");
        assert_eq!(err.category(), "config");
        assert!(err.message().contains("bad"));
    }
}
