//! Step executor
//!
//! Runs a single plan step: exec, echo or sleep.

use std::time::Duration;

use tracing::{debug, instrument};

use crate::error::SeriateError;
use crate::plan::{ExecParams, Step, StepAction};

/// Executes individual steps. Stateless and cheap to clone into producers.
#[derive(Debug, Clone, Default)]
pub struct StepExecutor;

impl StepExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute a step and return its trimmed text output
    #[instrument(skip(self, step), fields(step_id = %step.id, verb = step.action.verb()))]
    pub async fn execute(&self, step: &Step) -> Result<String, SeriateError> {
        debug!("Executing step");
        match &step.action {
            StepAction::Exec { exec } => self.execute_exec(&step.id, exec).await,
            StepAction::Echo { echo } => Ok(echo.text.clone()),
            StepAction::Sleep { sleep } => {
                tokio::time::sleep(Duration::from_millis(sleep.ms)).await;
                Ok(String::new())
            }
        }
    }

    async fn execute_exec(&self, id: &str, exec: &ExecParams) -> Result<String, SeriateError> {
        let output = tokio::time::timeout(
            Duration::from_secs(exec.timeout_secs),
            tokio::process::Command::new("sh")
                .arg("-c")
                .arg(&exec.command)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| SeriateError::StepTimeout {
            id: id.to_string(),
            secs: exec.timeout_secs,
        })?
        .map_err(|e| SeriateError::StepFailed {
            id: id.to_string(),
            reason: format!("failed to spawn command: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match output.status.code() {
                Some(code) => format!("exit status {}: {}", code, stderr.trim()),
                None => format!("terminated by signal: {}", stderr.trim()),
            };
            return Err(SeriateError::StepFailed {
                id: id.to_string(),
                reason,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
