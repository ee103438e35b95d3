//! Plan runner
//!
//! Turns each plan step into a producer and drives them with
//! [`run_in_series_logged`]: one step at a time, stopping at the first
//! failure.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::SeriateError;
use crate::event_log::EventLog;
use crate::plan::Plan;
use crate::series::run_in_series_logged;
use crate::step_executor::StepExecutor;

/// Output of one completed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutput {
    pub id: String,
    pub output: String,
}

pub struct PlanRunner {
    plan: Plan,
    executor: StepExecutor,
    event_log: EventLog,
}

impl PlanRunner {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            executor: StepExecutor::new(),
            event_log: EventLog::new(),
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Events recorded so far
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    #[instrument(skip(self), fields(steps = self.plan.steps.len()))]
    pub async fn run(&self) -> Result<Vec<StepOutput>, SeriateError> {
        info!("Starting plan execution");

        let producers: Vec<_> = self
            .plan
            .steps
            .iter()
            .map(|step| {
                let step = Arc::clone(step);
                let executor = self.executor.clone();
                move || async move { executor.execute(&step).await }
            })
            .collect();

        let outputs = run_in_series_logged(producers, &self.event_log).await?;

        Ok(self
            .plan
            .steps
            .iter()
            .zip(outputs)
            .map(|(step, output)| StepOutput {
                id: step.id.clone(),
                output,
            })
            .collect())
    }
}
