//! Confirmation seam.

use crate::error::RigError;

/// Answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Cancel,
}

/// Receives user-facing questions and warnings from the pipeline.
pub trait Prompter {
    /// Asked when some selected parts carry no region token. `Proceed`
    /// excludes them from the rig, `Cancel` aborts the run.
    fn confirm_invalid_names(&mut self, names: &[String]) -> Decision;

    /// Shown for every fatal error before the run is reverted.
    fn warn(&mut self, error: &RigError);
}

/// A prompter with a fixed answer that records what it was shown.
#[derive(Debug, Clone)]
pub struct ScriptedPrompter {
    answer: Decision,
    /// Invalid-name lists received, in order.
    pub asked: Vec<Vec<String>>,
    /// Warning messages received, in order.
    pub warnings: Vec<String>,
}

impl ScriptedPrompter {
    /// Creates a prompter that always answers `answer`.
    pub fn new(answer: Decision) -> Self {
        Self {
            answer,
            asked: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Always proceeds.
    pub fn proceed() -> Self {
        Self::new(Decision::Proceed)
    }

    /// Always cancels.
    pub fn cancel() -> Self {
        Self::new(Decision::Cancel)
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm_invalid_names(&mut self, names: &[String]) -> Decision {
        self.asked.push(names.to_vec());
        self.answer
    }

    fn warn(&mut self, error: &RigError) {
        self.warnings.push(error.to_string());
    }
}
