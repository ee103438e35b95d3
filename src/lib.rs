//! Seriate - run async task producers strictly one after another

pub mod error;
pub mod event_log;
pub mod plan;
pub mod runner;
pub mod series;
pub mod step_executor;

pub use error::{FixSuggestion, SeriateError};
pub use event_log::{Event, EventEmitter, EventKind, EventLog, NoopEmitter};
pub use plan::{OutputFormat, OutputPolicy, Plan, Step, StepAction};
pub use runner::{PlanRunner, StepOutput};
pub use series::{fold_in_series, run_in_series, run_in_series_logged, BoxProducer, Series};
pub use step_executor::StepExecutor;
