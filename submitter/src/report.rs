use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// The final state of one scenario in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    /// The scenario directory does not exist, nothing was written.
    Skipped,
    /// The job script was written but submission is switched off.
    NotSubmitted,
    Submitted,
    /// The job script could not be written or the queue command failed.
    SubmissionFailed(String),
}

impl ScenarioOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ScenarioOutcome::SubmissionFailed(_))
    }
}

impl Display for ScenarioOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioOutcome::Skipped => write!(f, "skipped, directory not found"),
            ScenarioOutcome::NotSubmitted => write!(f, "not submitted"),
            ScenarioOutcome::Submitted => write!(f, "submitted"),
            ScenarioOutcome::SubmissionFailed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub scenario: String,
    /// Set once the job script has been written.
    pub job_script: Option<PathBuf>,
    pub outcome: ScenarioOutcome,
}

/// Outcomes of every scenario of a batch, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub timestamp: String,
    pub scenarios: Vec<ScenarioReport>,
}

#[derive(Tabled)]
struct OutcomeTableRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Scenario")]
    scenario: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Job script")]
    job_script: String,
}

impl BatchReport {
    pub fn new(timestamp: String) -> Self {
        Self {
            timestamp,
            scenarios: vec![],
        }
    }

    pub fn push(&mut self, report: ScenarioReport) {
        self.scenarios.push(report);
    }

    /// Number of scenarios whose submission failed.
    pub fn failures(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|report| report.outcome.is_failure())
            .count()
    }

    pub fn count(&self, outcome: &ScenarioOutcome) -> usize {
        self.scenarios
            .iter()
            .filter(|report| &report.outcome == outcome)
            .count()
    }

    /// Render the outcomes as a table.
    pub fn table(&self) -> String {
        let rows = self
            .scenarios
            .iter()
            .enumerate()
            .map(|(index, report)| OutcomeTableRow {
                index: index + 1,
                scenario: report.scenario.clone(),
                outcome: report.outcome.to_string(),
                job_script: report
                    .job_script
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            });

        Table::new(rows).with(Style::modern()).to_string()
    }

    pub fn print_table(&self) {
        if self.scenarios.is_empty() {
            return;
        }

        println!("\nBatch {}", self.timestamp);
        println!("{}", self.table());
    }
}
