use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default name of the configuration file, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "hpc_submit.toml";

/// Default name of the job script template.
pub const DEFAULT_TEMPLATE_FILE: &str = "submit_template.sh";

/// Default queue submission command on the cluster.
pub const DEFAULT_QUEUE_COMMAND: &str = "bsub";

/// An error raised while loading the configuration. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings used in place of the regular ones when `testing_mode` is on.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestingSection {
    /// Defaults to the current working directory.
    #[serde(default)]
    base_path: Option<PathBuf>,
    #[serde(default = "TestingSection::default_executable")]
    executable: PathBuf,
    #[serde(default = "TestingSection::default_project")]
    project: String,
    #[serde(default = "TestingSection::default_datafile")]
    datafile: PathBuf,
    #[serde(default = "default_true")]
    confirm: bool,
}

impl TestingSection {
    fn default_executable() -> PathBuf {
        PathBuf::from("andean")
    }

    fn default_project() -> String {
        "demo_project".to_string()
    }

    fn default_datafile() -> PathBuf {
        PathBuf::from("demo_project/demo_data.csv")
    }
}

impl Default for TestingSection {
    fn default() -> Self {
        Self {
            base_path: None,
            executable: Self::default_executable(),
            project: Self::default_project(),
            datafile: Self::default_datafile(),
            confirm: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_template() -> PathBuf {
    PathBuf::from(DEFAULT_TEMPLATE_FILE)
}

fn default_queue_command() -> String {
    DEFAULT_QUEUE_COMMAND.to_string()
}

/// The configuration file as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_path: PathBuf,
    max_runs: usize,
    #[serde(default)]
    testing_mode: bool,
    #[serde(default = "default_true")]
    submit_enabled: bool,
    executable: PathBuf,
    #[serde(default = "default_template")]
    template: PathBuf,
    #[serde(default = "default_queue_command")]
    queue_command: String,
    #[serde(default)]
    testing: TestingSection,
}

/// The fixed demo run used by testing mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestingRun {
    pub project: String,
    pub datafile: PathBuf,
    /// Whether the user must confirm before the demo run starts.
    pub confirm: bool,
}

/// Process wide settings, resolved once at startup and never modified afterwards.
///
/// `base_path` and `executable_relative_path` already reflect `testing_mode`, so
/// the rest of the pipeline never needs to look at the testing switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    base_path: PathBuf,
    max_runs: usize,
    testing_mode: bool,
    submit_enabled: bool,
    executable_relative_path: PathBuf,
    template_path: PathBuf,
    queue_command: String,
    testing_run: TestingRun,
}

impl Config {
    /// Load and validate the configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse and validate the configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        Self::resolve(file)
    }

    fn resolve(file: ConfigFile) -> Result<Self, ConfigError> {
        if file.max_runs == 0 {
            return Err(ConfigError::Invalid(
                "'max_runs' must be at least 1".to_string(),
            ));
        }
        if file.queue_command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "'queue_command' must not be empty".to_string(),
            ));
        }

        let (base_path, executable_relative_path) = if file.testing_mode {
            let base_path = match file.testing.base_path {
                Some(base_path) => base_path,
                None => std::env::current_dir().map_err(|e| {
                    ConfigError::Invalid(format!(
                        "testing mode needs the current directory as base path: {e}"
                    ))
                })?,
            };
            (base_path, file.testing.executable)
        } else {
            (file.base_path, file.executable)
        };

        if executable_relative_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "executable path must not be empty".to_string(),
            ));
        }
        if executable_relative_path.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "executable path must be relative to the scenario, got {}",
                executable_relative_path.display()
            )));
        }

        Ok(Self {
            base_path,
            max_runs: file.max_runs,
            testing_mode: file.testing_mode,
            submit_enabled: file.submit_enabled,
            executable_relative_path,
            template_path: file.template,
            queue_command: file.queue_command,
            testing_run: TestingRun {
                project: file.testing.project,
                datafile: file.testing.datafile,
                confirm: file.testing.confirm,
            },
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn max_runs(&self) -> usize {
        self.max_runs
    }

    pub fn testing_mode(&self) -> bool {
        self.testing_mode
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    /// Location of the scenario executable, relative to the scenario directory.
    pub fn executable_relative_path(&self) -> &Path {
        &self.executable_relative_path
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn queue_command(&self) -> &str {
        &self.queue_command
    }

    pub fn testing_run(&self) -> &TestingRun {
        &self.testing_run
    }
}
