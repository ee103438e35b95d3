//! Error types with fix suggestions
//!
//! The series combinators never touch these: they hand back whatever error the
//! failing producer returned. `SeriateError` covers plan loading, step
//! execution and the CLI.

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum SeriateError {
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Plan validation errors (SERIATE-010 to SERIATE-014)
    // ─────────────────────────────────────────────────────────────
    #[error("SERIATE-010: Invalid schema: expected '{expected}', got '{actual}'")]
    InvalidSchema { expected: String, actual: String },

    #[error("SERIATE-011: Invalid step id '{id}'")]
    InvalidStepId { id: String },

    #[error("SERIATE-012: Duplicate step id '{id}'")]
    DuplicateStepId { id: String },

    #[error("SERIATE-013: Step '{id}' has an empty command")]
    EmptyCommand { id: String },

    #[error("SERIATE-014: Step '{id}' must have exactly one action (exec, echo or sleep), found {found}")]
    InvalidAction { id: String, found: usize },

    // ─────────────────────────────────────────────────────────────
    // Step execution errors (SERIATE-020 to SERIATE-021)
    // ─────────────────────────────────────────────────────────────
    #[error("SERIATE-020: Step '{id}' failed: {reason}")]
    StepFailed { id: String, reason: String },

    #[error("SERIATE-021: Step '{id}' timed out after {secs}s")]
    StepTimeout { id: String, secs: u64 },
}

impl SeriateError {
    /// Id of the step this error belongs to, if any
    pub fn step_id(&self) -> Option<&str> {
        match self {
            SeriateError::InvalidStepId { id }
            | SeriateError::DuplicateStepId { id }
            | SeriateError::EmptyCommand { id }
            | SeriateError::InvalidAction { id, .. }
            | SeriateError::StepFailed { id, .. }
            | SeriateError::StepTimeout { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl FixSuggestion for SeriateError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            SeriateError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            SeriateError::Io(_) => Some("Check file path and permissions"),
            SeriateError::InvalidSchema { .. } => Some("Set schema: seriate/plan@0.1"),
            SeriateError::InvalidStepId { .. } => {
                Some("Start ids with a letter; use only letters, digits, '-' and '_'")
            }
            SeriateError::DuplicateStepId { .. } => Some("Use unique ids for every step"),
            SeriateError::EmptyCommand { .. } => Some("Give the exec step a command to run"),
            SeriateError::InvalidAction { .. } => {
                Some("Keep one of exec:, echo: or sleep: per step; split extra actions into new steps")
            }
            SeriateError::StepFailed { .. } => Some("Run the step's command by hand to see why"),
            SeriateError::StepTimeout { .. } => Some("Raise timeout_secs on the step"),
        }
    }
}
