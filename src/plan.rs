//! Plan file parsing and validation
//!
//! A plan is a YAML list of steps that `seriate run` executes in series:
//!
//! ```yaml
//! schema: seriate/plan@0.1
//! output:
//!   format: json
//! steps:
//!   - id: fetch
//!     exec:
//!       command: "curl -s https://example.com"
//!       timeout_secs: 10
//!   - id: pause
//!     sleep:
//!       ms: 250
//!   - id: done
//!     echo:
//!       text: "finished"
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::SeriateError;

pub const PLAN_SCHEMA: &str = "seriate/plan@0.1";

/// Default timeout for exec steps (60 seconds)
pub const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 60;

static STEP_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("step id pattern is valid"));

/// Plan parsed from YAML (raw)
#[derive(Debug, Deserialize)]
struct PlanRaw {
    pub schema: String,
    #[serde(default)]
    pub output: OutputPolicy,
    #[serde(default)]
    pub steps: Vec<StepRaw>,
}

/// Step as written in YAML: an id plus whichever verb keys are present
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepRaw {
    pub id: String,
    #[serde(default)]
    pub exec: Option<ExecParams>,
    #[serde(default)]
    pub echo: Option<EchoParams>,
    #[serde(default)]
    pub sleep: Option<SleepParams>,
}

impl StepRaw {
    /// Resolve the verb keys into a single action
    fn into_step(self) -> Result<Step, SeriateError> {
        let StepRaw {
            id,
            exec,
            echo,
            sleep,
        } = self;

        let action = match (exec, echo, sleep) {
            (Some(exec), None, None) => StepAction::Exec { exec },
            (None, Some(echo), None) => StepAction::Echo { echo },
            (None, None, Some(sleep)) => StepAction::Sleep { sleep },
            (exec, echo, sleep) => {
                let found = [exec.is_some(), echo.is_some(), sleep.is_some()]
                    .into_iter()
                    .filter(|present| *present)
                    .count();
                return Err(SeriateError::InvalidAction { id, found });
            }
        };

        Ok(Step { id, action })
    }
}

/// Plan with Arc-wrapped steps so producers can own them cheaply
#[derive(Debug)]
pub struct Plan {
    pub schema: String,
    pub output: OutputPolicy,
    pub steps: Vec<Arc<Step>>,
}

impl PlanRaw {
    fn into_plan(self) -> Result<Plan, SeriateError> {
        let steps = self
            .steps
            .into_iter()
            .map(|step| step.into_step().map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Plan {
            schema: self.schema,
            output: self.output,
            steps,
        })
    }
}

impl Plan {
    /// Parse and validate a plan from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self, SeriateError> {
        let raw: PlanRaw = serde_yaml::from_str(yaml)?;
        let plan = raw.into_plan()?;
        plan.validate()?;
        Ok(plan)
    }

    /// Read, parse and validate a plan file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SeriateError> {
        let yaml = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&yaml)
    }

    /// Check schema, step ids and step actions
    pub fn validate(&self) -> Result<(), SeriateError> {
        if self.schema != PLAN_SCHEMA {
            return Err(SeriateError::InvalidSchema {
                expected: PLAN_SCHEMA.to_string(),
                actual: self.schema.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if !STEP_ID_PATTERN.is_match(&step.id) {
                return Err(SeriateError::InvalidStepId {
                    id: step.id.clone(),
                });
            }
            if !seen.insert(step.id.as_str()) {
                return Err(SeriateError::DuplicateStepId {
                    id: step.id.clone(),
                });
            }
            if let StepAction::Exec { exec } = &step.action {
                if exec.command.trim().is_empty() {
                    return Err(SeriateError::EmptyCommand {
                        id: step.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Step {
    pub id: String,
    pub action: StepAction,
}

/// Step verbs - exactly one per step
#[derive(Debug, Clone)]
pub enum StepAction {
    Exec { exec: ExecParams },
    Echo { echo: EchoParams },
    Sleep { sleep: SleepParams },
}

impl StepAction {
    pub fn verb(&self) -> &'static str {
        match self {
            StepAction::Exec { .. } => "exec",
            StepAction::Echo { .. } => "echo",
            StepAction::Sleep { .. } => "sleep",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecParams {
    pub command: String,
    #[serde(default = "default_exec_timeout")]
    pub timeout_secs: u64,
}

fn default_exec_timeout() -> u64 {
    DEFAULT_EXEC_TIMEOUT_SECS
}

#[derive(Debug, Clone, Deserialize)]
pub struct EchoParams {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SleepParams {
    pub ms: u64,
}

/// Output policy configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputPolicy {
    /// Output format (text or json)
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format enum
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per step (default)
    #[default]
    Text,

    /// JSON array of step outputs
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_verbs() {
        let yaml = r#"
schema: seriate/plan@0.1
steps:
  - id: build
    exec:
      command: "cargo build"
      timeout_secs: 5
  - id: wait
    sleep:
      ms: 10
  - id: say
    echo:
      text: "hi"
"#;
        let plan = Plan::from_yaml(yaml).unwrap();
        assert_eq!(plan.steps.len(), 3);
        assert_eq!(plan.output.format, OutputFormat::Text);

        match &plan.steps[0].action {
            StepAction::Exec { exec } => {
                assert_eq!(exec.command, "cargo build");
                assert_eq!(exec.timeout_secs, 5);
            }
            other => panic!("expected exec, got {}", other.verb()),
        }
        assert_eq!(plan.steps[1].action.verb(), "sleep");
        assert_eq!(plan.steps[2].action.verb(), "echo");
    }

    #[test]
    fn exec_timeout_defaults() {
        let yaml = r#"
schema: seriate/plan@0.1
steps:
  - id: a
    exec:
      command: "true"
"#;
        let plan = Plan::from_yaml(yaml).unwrap();
        let StepAction::Exec { exec } = &plan.steps[0].action else {
            panic!("expected exec");
        };
        assert_eq!(exec.timeout_secs, DEFAULT_EXEC_TIMEOUT_SECS);
    }

    #[test]
    fn parse_json_output_format() {
        let yaml = r#"
schema: seriate/plan@0.1
output:
  format: json
steps: []
"#;
        let plan = Plan::from_yaml(yaml).unwrap();
        assert_eq!(plan.output.format, OutputFormat::Json);
        assert!(plan.steps.is_empty());
    }

    #[test]
    fn rejects_wrong_schema() {
        let err = Plan::from_yaml("schema: other@1\nsteps: []\n").unwrap_err();
        assert!(matches!(err, SeriateError::InvalidSchema { .. }));
    }

    #[test]
    fn rejects_bad_step_id() {
        let yaml = r#"
schema: seriate/plan@0.1
steps:
  - id: 9lives
    echo:
      text: "x"
"#;
        let err = Plan::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SeriateError::InvalidStepId { id } if id == "9lives"));
    }

    #[test]
    fn rejects_duplicate_step_id() {
        let yaml = r#"
schema: seriate/plan@0.1
steps:
  - id: same
    echo:
      text: "x"
  - id: same
    echo:
      text: "y"
"#;
        let err = Plan::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SeriateError::DuplicateStepId { id } if id == "same"));
    }

    #[test]
    fn rejects_blank_command() {
        let yaml = r#"
schema: seriate/plan@0.1
steps:
  - id: blank
    exec:
      command: "   "
"#;
        let err = Plan::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SeriateError::EmptyCommand { .. }));
    }

    #[test]
    fn rejects_unknown_verb() {
        let yaml = r#"
schema: seriate/plan@0.1
steps:
  - id: odd
    fetch:
      url: "https://example.com"
"#;
        let err = Plan::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SeriateError::YamlParse(_)));
    }

    #[test]
    fn rejects_step_with_two_actions() {
        let yaml = r#"
schema: seriate/plan@0.1
steps:
  - id: both
    exec:
      command: "rm -rf /tmp/x"
    echo:
      text: "just saying hi"
"#;
        let err = Plan::from_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            SeriateError::InvalidAction { ref id, found: 2 } if id == "both"
        ));
    }

    #[test]
    fn rejects_step_without_action() {
        let yaml = r#"
schema: seriate/plan@0.1
steps:
  - id: idle
"#;
        let err = Plan::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SeriateError::InvalidAction { found: 0, .. }));
    }

    #[test]
    fn rejects_unknown_step_key() {
        let yaml = r#"
schema: seriate/plan@0.1
steps:
  - id: typo
    echo:
      text: "x"
    bogus_key: 1
"#;
        let err = Plan::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SeriateError::YamlParse(_)));
        assert!(err.to_string().contains("bogus_key"));
    }
}
