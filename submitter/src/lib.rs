//! Submit batches of simulation scenarios to an HPC cluster queue.
//!
//! A parameter table lists one scenario per row. For each scenario a job script is rendered from
//! a template, written into the scenario directory and passed to the queue submission command
//! (`bsub` by default) on its standard input.
//!
//! Scenario directories are expected at `<base_path>/<project>/<scenario>/`, next to the scenario
//! executable, and are never created by this tool.

#[macro_use]
extern crate log;

pub mod cli;
pub mod config;
pub mod confirm;
pub mod paths;
pub mod report;
pub mod run;
pub mod submit;
pub mod table;
pub mod template;
pub mod writer;

pub mod prelude {
    pub use crate::config::{Config, ConfigError};
    pub use crate::paths::ResolvedPaths;
    pub use crate::report::{BatchReport, ScenarioOutcome, ScenarioReport};
    pub use crate::run::{submit_batch, BatchRunner};
    pub use crate::submit::{JobSubmitter, SubmitError, SubmitStatus};
    pub use crate::table::{RunBatch, ScenarioRow, TableError};
    pub use crate::template::{JobTemplate, TemplateError};
}
