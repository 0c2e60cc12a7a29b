use crate::config::Config;
use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

/// Format of the batch timestamp embedded in job script names.
pub const BATCH_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Render the timestamp shared by every job script of one batch.
pub fn batch_timestamp<Tz>(now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.format(BATCH_TIMESTAMP_FORMAT).to_string()
}

/// Name of the job script file for a batch timestamp, without extension.
pub fn job_script_stem(timestamp: &str) -> String {
    format!("jobscript_{timestamp}")
}

/// Where everything for a single scenario lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub scenario_dir: PathBuf,
    pub executable_path: PathBuf,
    pub job_script_path: PathBuf,
}

impl ResolvedPaths {
    /// Compute the paths for a scenario of a project.
    ///
    /// `<base>/<project>/<scenario>/<executable>`, with the job script written next to the
    /// executable.
    ///
    /// Paths are joined as-is: an absolute `project` or `scenario` replaces everything before
    /// it, including the base path.
    pub fn resolve(config: &Config, project: &str, scenario: &str, timestamp: &str) -> Self {
        for part in [project, scenario] {
            if Path::new(part).is_absolute() {
                debug!("Absolute path component '{part}' replaces the base path");
            }
        }

        let executable_path = config
            .base_path()
            .join(project)
            .join(scenario)
            .join(config.executable_relative_path());
        let scenario_dir = executable_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let job_script_path = scenario_dir.join(format!("{}.sh", job_script_stem(timestamp)));

        Self {
            scenario_dir,
            executable_path,
            job_script_path,
        }
    }

    /// The executable path as the cluster expects it, with forward slashes only.
    pub fn remote_executable(&self) -> String {
        self.executable_path.to_string_lossy().replace('\\', "/")
    }
}
