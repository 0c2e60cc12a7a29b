use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_FILE;

/// Generate job scripts for every scenario of a project and submit them to the HPC queue.
#[derive(Debug, Parser)]
#[command(about, long_about = None)]
pub struct CliArgs {
    /// Project name, common to all scenarios in the parameter table.
    ///
    /// Ignored in testing mode, where the demo project is used.
    pub project: Option<String>,

    /// Full path to the parameter table (comma, semicolon or tab separated).
    pub datafile: Option<PathBuf>,

    /// Path to the configuration file.
    #[arg(long, env = "HPC_SUBMIT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Do not ask for confirmation before a testing mode run.
    #[arg(long, short, default_value = "false")]
    pub yes: bool,

    /// Exit with an error if any scenario fails to submit.
    ///
    /// By default only problems with the parameter table or the configuration change the exit code.
    #[arg(long, default_value = "false")]
    pub fail_on_submission_error: bool,
}
