use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// A submission problem for a single scenario. Never fatal to the batch.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Failed to open job script {path}: {source}")]
    OpenScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to run queue command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Queue command '{command}' failed with status: {status}")]
    Rejected { command: String, status: ExitStatus },
}

/// What happened to a job script after it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Submitted,
    /// Submission is switched off in the configuration.
    NotSubmitted,
}

/// An interface to the cluster's queue submission command, e.g. `bsub`.
///
/// The job script is passed on standard input and the command runs from the scenario directory.
#[derive(Debug, Clone)]
pub struct JobSubmitter {
    command: String,
    enabled: bool,
}

impl JobSubmitter {
    pub fn new<S>(command: S, enabled: bool) -> Self
    where
        S: Into<String>,
    {
        Self {
            command: command.into(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look the queue command up in `PATH`.
    ///
    /// Only used to warn early, a missing command fails each scenario on its own.
    pub fn locate(&self) -> Result<PathBuf, which::Error> {
        which::which(&self.command)
    }

    /// Hand a job script to the queue.
    pub fn submit(
        &self,
        job_script: &Path,
        scenario_dir: &Path,
    ) -> Result<SubmitStatus, SubmitError> {
        if !self.enabled {
            return Ok(SubmitStatus::NotSubmitted);
        }

        let script = File::open(job_script).map_err(|source| SubmitError::OpenScript {
            path: job_script.to_path_buf(),
            source,
        })?;

        let mut process = Command::new(&self.command)
            .current_dir(scenario_dir)
            .stdin(Stdio::from(script))
            .spawn()
            .map_err(|source| SubmitError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        debug!(
            "Running '{command}' with PID: {pid}",
            command = self.command,
            pid = process.id()
        );
        let status = process.wait().map_err(|source| SubmitError::Spawn {
            command: self.command.clone(),
            source,
        })?;
        debug!("'{}' finished with status: {status}", self.command);

        if status.success() {
            Ok(SubmitStatus::Submitted)
        } else {
            Err(SubmitError::Rejected {
                command: self.command.clone(),
                status,
            })
        }
    }
}
