//! JSON output types for the `--json` flag.

use autorig_assembly::{RigError, RigReport};
use autorig_spec::{NamingReport, PartMatch, StageError, TopologyEdge, ValidationError};
use serde::Serialize;

use crate::input::InputError;

/// Stable error codes for CLI-level failures. Pipeline failures pass their
/// own `RIG_xxx` codes through and naming diagnostics their `Nxxx` codes.
pub mod error_codes {
    /// File could not be read
    pub const FILE_READ: &str = "CLI_001";
    /// JSON parse error
    pub const JSON_PARSE: &str = "CLI_002";
    /// Scene could not be built from the parts document
    pub const INVALID_SCENE: &str = "CLI_003";
    /// `--select` names a node that does not exist
    pub const UNKNOWN_NODE: &str = "CLI_004";
    /// Config file could not be loaded
    pub const CONFIG: &str = "CLI_005";
    /// Output file could not be written
    pub const WRITE: &str = "CLI_006";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonError {
    pub code: String,
    pub message: String,
    /// Pipeline stage that failed (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Offending part name (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,
    /// Source file path (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl JsonError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category: None,
            part: None,
            file: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Converts an input error into a JSON error.
pub fn input_error_to_json(err: &InputError, file: Option<&str>) -> JsonError {
    let code = match err {
        InputError::FileRead { .. } => error_codes::FILE_READ,
        InputError::JsonParse { .. } => error_codes::JSON_PARSE,
        InputError::InvalidScene { .. } => error_codes::INVALID_SCENE,
        InputError::UnknownNode { .. } => error_codes::UNKNOWN_NODE,
        InputError::Config { .. } => error_codes::CONFIG,
    };
    let mut error = JsonError::new(code, err.to_string());
    error.file = file.map(str::to_string);
    error
}

/// Converts a pipeline error into a JSON error.
pub fn rig_error_to_json(err: &RigError) -> JsonError {
    let mut error = JsonError::new(err.code(), err.to_string());
    error.category = Some(err.category().to_string());
    error
}

/// Converts a naming diagnostic into a JSON error.
pub fn validation_error_to_json(err: &ValidationError) -> JsonError {
    let mut error = JsonError::new(err.code.code(), err.message.clone());
    error.category = Some("naming".to_string());
    error.part = err.part.clone();
    error
}

/// Output of `validate --json`.
#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched: Vec<PartMatch>,
}

impl ValidateOutput {
    pub fn from_report(report: &NamingReport) -> Self {
        Self {
            success: report.is_clean(),
            errors: report
                .to_validation_result()
                .errors
                .iter()
                .map(validation_error_to_json)
                .collect(),
            matched: report.matched.clone(),
        }
    }

    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            matched: Vec::new(),
        }
    }
}

/// Output of `rig --json`, `bind --json` and `locate --json`.
#[derive(Debug, Serialize)]
pub struct RigOutput {
    pub success: bool,
    /// `completed`, `cancelled` or `failed`
    pub outcome: &'static str,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RigReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<BindSummary>,
    /// Locator names, in insertion order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locators: Option<Vec<String>>,
    /// Path the scene was written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,
}

impl RigOutput {
    pub fn completed(report: RigReport, out: String) -> Self {
        Self {
            success: true,
            outcome: "completed",
            errors: Vec::new(),
            report: Some(report),
            bindings: None,
            locators: None,
            out: Some(out),
        }
    }

    pub fn bound(bindings: BindSummary, out: String) -> Self {
        Self {
            success: true,
            outcome: "completed",
            errors: Vec::new(),
            report: None,
            bindings: Some(bindings),
            locators: None,
            out: Some(out),
        }
    }

    pub fn located(locators: Vec<String>, out: String) -> Self {
        Self {
            success: true,
            outcome: "completed",
            errors: Vec::new(),
            report: None,
            bindings: None,
            locators: Some(locators),
            out: Some(out),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            success: false,
            outcome: "cancelled",
            errors: Vec::new(),
            report: None,
            bindings: None,
            locators: None,
            out: None,
        }
    }

    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            outcome: "failed",
            errors,
            report: None,
            bindings: None,
            locators: None,
            out: None,
        }
    }
}

/// Binding counts reported by `bind`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BindSummary {
    pub bound: Vec<String>,
    pub skipped: Vec<String>,
    pub drives: usize,
}

/// Output of `topology --json`.
#[derive(Debug, Serialize)]
pub struct TopologyOutput {
    pub preset: &'static str,
    pub edges: Vec<TopologyEdge>,
}

/// One node line of `inspect --json`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InspectNode {
    pub name: String,
    pub kind: &'static str,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Output of `inspect --json`.
#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    pub nodes: Vec<InspectNode>,
    pub constraints: usize,
    pub bindings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rig_hash: Option<String>,
}

/// Prints a serializable output as pretty JSON on stdout.
pub fn print_json<T: Serialize>(output: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}
