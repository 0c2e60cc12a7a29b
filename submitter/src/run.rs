use crate::config::Config;
use crate::paths::{batch_timestamp, job_script_stem, ResolvedPaths};
use crate::report::{BatchReport, ScenarioOutcome, ScenarioReport};
use crate::submit::{JobSubmitter, SubmitStatus};
use crate::table::{RunBatch, ScenarioRow};
use crate::template::{
    JobTemplate, INJECTED_KEYS, OUTPUT_KEY, PATH_EXECUTABLE_KEY, PROJECT_NAME_KEY,
};
use crate::writer::write_job_script;
use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;

const SEPARATOR: &str = "-----------------------------------------------------";

/// Load, render, write and submit every scenario of a parameter table.
///
/// Any problem with the table or the template fails the whole batch before a single scenario
/// is touched. Problems with individual scenarios are only recorded in the returned report.
pub fn submit_batch(
    config: &Config,
    project: &str,
    datafile: &Path,
) -> anyhow::Result<BatchReport> {
    let batch = RunBatch::from_file(datafile, config.max_runs())?;
    info!(
        "Loaded {} scenario(s) from {}",
        batch.len(),
        datafile.display()
    );

    let template = JobTemplate::from_file(config.template_path())?;
    let submitter = JobSubmitter::new(config.queue_command(), config.submit_enabled());

    BatchRunner::new(
        config,
        project,
        template,
        submitter,
        batch_timestamp(chrono::Local::now()),
    )
    .run(&batch)
}

/// Processes the scenarios of one batch, one at a time in table order.
pub struct BatchRunner<'a> {
    config: &'a Config,
    project: &'a str,
    template: JobTemplate,
    submitter: JobSubmitter,
    timestamp: String,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        config: &'a Config,
        project: &'a str,
        template: JobTemplate,
        submitter: JobSubmitter,
        timestamp: String,
    ) -> Self {
        Self {
            config,
            project,
            template,
            submitter,
            timestamp,
        }
    }
}

impl BatchRunner<'_> {
    pub fn run(&self, batch: &RunBatch) -> anyhow::Result<BatchReport> {
        self.template
            .check_keys(
                batch
                    .header()
                    .iter()
                    .map(String::as_str)
                    .chain(INJECTED_KEYS),
            )
            .context("Job script template does not match the parameter table")?;

        if self.submitter.is_enabled() {
            if let Err(e) = self.submitter.locate() {
                warn!(
                    "Queue command '{}' not found ({e}), submissions are likely to fail",
                    self.config.queue_command()
                );
            }
        }

        let mut report = BatchReport::new(self.timestamp.clone());
        for row in batch.rows() {
            report.push(self.run_scenario(row)?);
        }

        println!("\n ----------------- END OF EXECUTION ----------------- \n");

        Ok(report)
    }

    fn run_scenario(&self, row: &ScenarioRow) -> anyhow::Result<ScenarioReport> {
        let scenario = row.scenario();
        let paths = ResolvedPaths::resolve(self.config, self.project, scenario, &self.timestamp);
        debug!("Resolved paths for scenario '{scenario}': {paths:?}");

        if !paths.scenario_dir.is_dir() {
            warn!(
                "Scenario directory {} does not exist",
                paths.scenario_dir.display()
            );
            println!("Scenario '{scenario}' skipped, directory not found");
            return Ok(ScenarioReport {
                scenario: scenario.to_string(),
                job_script: None,
                outcome: ScenarioOutcome::Skipped,
            });
        }

        let script = self.render(row, &paths)?;

        println!("{SEPARATOR}");
        if let Err(e) = write_job_script(&paths.job_script_path, &script) {
            warn!("{e:#}");
            println!("Submission file for scenario '{scenario}' could not be written");
            return Ok(ScenarioReport {
                scenario: scenario.to_string(),
                job_script: None,
                outcome: ScenarioOutcome::SubmissionFailed(format!("{e:#}")),
            });
        }
        println!("Submission file for scenario '{scenario}' created");

        let outcome = match self
            .submitter
            .submit(&paths.job_script_path, &paths.scenario_dir)
        {
            Ok(SubmitStatus::Submitted) => {
                println!("Scenario '{scenario}' successfully submitted");
                ScenarioOutcome::Submitted
            }
            Ok(SubmitStatus::NotSubmitted) => {
                println!(
                    "Scenario '{scenario}' not submitted, submission is disabled in the configuration"
                );
                ScenarioOutcome::NotSubmitted
            }
            Err(e) => {
                warn!("Submission of scenario '{scenario}' failed: {e}");
                println!("Scenario '{scenario}' failed to submit");
                ScenarioOutcome::SubmissionFailed(e.to_string())
            }
        };

        Ok(ScenarioReport {
            scenario: scenario.to_string(),
            job_script: Some(paths.job_script_path),
            outcome,
        })
    }

    /// Substitute the row and the injected keys into the template.
    ///
    /// Injected keys take precedence over columns of the same name.
    fn render(&self, row: &ScenarioRow, paths: &ResolvedPaths) -> anyhow::Result<String> {
        let path_executable = paths.remote_executable();
        let output = job_script_stem(&self.timestamp);

        let mut values = row.fields().collect::<HashMap<&str, &str>>();
        values.insert(PROJECT_NAME_KEY, self.project);
        values.insert(PATH_EXECUTABLE_KEY, &path_executable);
        values.insert(OUTPUT_KEY, &output);

        self.template
            .render(&values)
            .with_context(|| {
                format!(
                    "Failed to render job script for scenario '{}'",
                    row.scenario()
                )
            })
    }
}
