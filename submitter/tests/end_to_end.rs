use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

const TEMPLATE: &str = "#MEM=$mem\nOUT=$path_executable\n";

/// A throwaway cluster layout with a configuration, a template and a parameter table.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("base")).expect("failed to create base dir");
        std::fs::write(dir.path().join("submit_template.sh"), TEMPLATE)
            .expect("failed to write template");

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn base(&self) -> PathBuf {
        self.path().join("base")
    }

    /// Directory that holds the executable of a scenario, where job scripts are written.
    fn scenario_dir(&self, scenario: &str) -> PathBuf {
        self.base().join("project").join(scenario).join("model")
    }

    fn create_scenario(&self, scenario: &str) {
        std::fs::create_dir_all(self.scenario_dir(scenario)).expect("failed to create scenario");
    }

    fn write_table(&self, content: &str) -> PathBuf {
        let path = self.path().join("runs.csv");
        std::fs::write(&path, content).expect("failed to write table");
        path
    }

    fn write_config(&self, submit_enabled: bool, queue_command: &str, extra: &str) -> PathBuf {
        let path = self.path().join("hpc_submit.toml");
        std::fs::write(
            &path,
            format!(
                r#"
base_path = "{base}"
max_runs = 2
submit_enabled = {submit_enabled}
executable = "model/Balmorel"
template = "{template}"
queue_command = "{queue_command}"
{extra}
"#,
                base = self.base().display(),
                template = self.path().join("submit_template.sh").display(),
            ),
        )
        .expect("failed to write config");
        path
    }

    /// A stand-in for the queue command which stores its stdin in the working directory.
    #[cfg(unix)]
    fn fake_queue_command(&self, exit_code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt as _;

        let path = self.path().join("fake_bsub");
        std::fs::write(
            &path,
            format!("#!/bin/sh\ncat > received.txt\nexit {exit_code}\n"),
        )
        .expect("failed to write command");
        let mut perms = std::fs::metadata(&path)
            .expect("failed to read metadata")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("failed to set permissions");
        path
    }

    fn job_scripts(&self, scenario: &str) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.scenario_dir(scenario)) else {
            return vec![];
        };

        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("jobscript_") && n.ends_with(".sh"))
            })
            .collect()
    }
}

fn run(config: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_hpc-submit"))
        .env_remove("HPC_SUBMIT_CONFIG")
        .arg("--config")
        .arg(config)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run hpc-submit");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");

    child.wait_with_output().expect("failed to wait for hpc-submit")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[cfg(unix)]
#[test]
fn test_should_write_and_submit_job_script() {
    let fixture = Fixture::new();
    fixture.create_scenario("s1");
    let command = fixture.fake_queue_command(0);
    let config = fixture.write_config(true, &command.display().to_string(), "");
    let table = fixture.write_table("scenario,mem\ns1,4GB\n");

    let output = run(&config, &["project", &table.display().to_string()], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let scripts = fixture.job_scripts("s1");
    assert_eq!(scripts.len(), 1);
    let script = std::fs::read_to_string(&scripts[0]).expect("failed to read job script");
    let executable = fixture
        .scenario_dir("s1")
        .join("Balmorel")
        .to_string_lossy()
        .replace('\\', "/");
    assert_eq!(script, format!("#MEM=4GB\nOUT={executable}\n"));

    let received = std::fs::read_to_string(fixture.scenario_dir("s1").join("received.txt"))
        .expect("queue command did not run in the scenario directory");
    assert_eq!(received, script);
    assert!(stdout(&output).contains("Scenario 's1' successfully submitted"));
    assert!(stdout(&output).contains("END OF EXECUTION"));
}

#[test]
fn test_should_skip_missing_scenario_directory() {
    let fixture = Fixture::new();
    let config = fixture.write_config(true, "/non/existent/bsub", "");
    let table = fixture.write_table("scenario,mem\ns1,4GB\n");

    let output = run(&config, &["project", &table.display().to_string()], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert!(fixture.job_scripts("s1").is_empty());
    assert!(!fixture.scenario_dir("s1").exists());
    assert!(stdout(&output).contains("Scenario 's1' skipped, directory not found"));
    assert!(stdout(&output).contains("END OF EXECUTION"));
}

#[test]
fn test_should_write_without_submitting_when_disabled() {
    let fixture = Fixture::new();
    fixture.create_scenario("s1");
    let config = fixture.write_config(false, "/non/existent/bsub", "");
    let table = fixture.write_table("scenario;mem\ns1;4GB\n");

    let output = run(&config, &["project", &table.display().to_string()], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert_eq!(fixture.job_scripts("s1").len(), 1);
    assert!(!fixture.scenario_dir("s1").join("received.txt").exists());
    assert!(stdout(&output).contains("Scenario 's1' not submitted"));
}

#[test]
fn test_should_fail_when_table_is_missing() {
    let fixture = Fixture::new();
    fixture.create_scenario("s1");
    let config = fixture.write_config(false, "bsub", "");
    let table = fixture.path().join("missing.csv");

    let output = run(&config, &["project", &table.display().to_string()], "");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Parameter table not found"));
    assert!(!stdout(&output).contains("END OF EXECUTION"));
    assert!(fixture.job_scripts("s1").is_empty());
}

#[test]
fn test_should_fail_on_incomplete_rows_without_writing() {
    let fixture = Fixture::new();
    fixture.create_scenario("s1");
    fixture.create_scenario("s2");
    let config = fixture.write_config(false, "bsub", "");
    let table = fixture.write_table("scenario,mem\ns1,4GB\ns2,\n");

    let output = run(&config, &["project", &table.display().to_string()], "");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Incomplete rows"));
    assert!(fixture.job_scripts("s1").is_empty());
    assert!(fixture.job_scripts("s2").is_empty());
}

#[test]
fn test_should_fail_on_too_many_runs() {
    let fixture = Fixture::new();
    let config = fixture.write_config(false, "bsub", "");
    let table = fixture.write_table("scenario,mem\ns1,1\ns2,2\ns3,3\n");

    let output = run(&config, &["project", &table.display().to_string()], "");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("at most 2 are allowed"));
}

#[test]
fn test_should_fail_on_invalid_config() {
    let fixture = Fixture::new();
    let config = fixture.path().join("hpc_submit.toml");
    std::fs::write(&config, "max_runs = 'many'\n").expect("failed to write config");
    let table = fixture.write_table("scenario,mem\ns1,4GB\n");

    let output = run(&config, &["project", &table.display().to_string()], "");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("valid configuration"));
}

#[test]
fn test_should_require_arguments_outside_testing_mode() {
    let fixture = Fixture::new();
    let config = fixture.write_config(false, "bsub", "");

    let output = run(&config, &[], "");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Missing argument: project name"));
}

#[cfg(unix)]
#[test]
fn test_should_only_fail_on_submission_errors_when_asked() {
    let fixture = Fixture::new();
    fixture.create_scenario("s1");
    fixture.create_scenario("s2");
    let command = fixture.fake_queue_command(1);
    let config = fixture.write_config(true, &command.display().to_string(), "");
    let table = fixture.write_table("scenario,mem\ns1,4GB\ns2,8GB\n");
    let table = table.display().to_string();

    let output = run(&config, &["project", &table], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Scenario 's1' failed to submit"));
    assert!(stdout(&output).contains("Scenario 's2' failed to submit"));

    let output = run(
        &config,
        &["--fail-on-submission-error", "project", &table],
        "",
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("2 out of 2 scenario(s) failed to submit"));
}

#[test]
fn test_should_run_demo_project_in_testing_mode_after_confirmation() {
    let fixture = Fixture::new();
    fixture.create_scenario("demo_s1");
    let table = fixture.write_table("scenario,mem\ndemo_s1,4GB\n");
    let config = fixture.write_config(
        false,
        "bsub",
        &format!(
            r#"
testing_mode = true

[testing]
base_path = "{base}"
executable = "model/Balmorel"
project = "project"
datafile = "{table}"
"#,
            base = fixture.base().display(),
            table = table.display(),
        ),
    );

    let output = run(&config, &[], "n\n");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(fixture.job_scripts("demo_s1").is_empty());

    let output = run(&config, &["ignored", "/ignored.csv"], "y\n");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(fixture.job_scripts("demo_s1").len(), 1);
    assert!(stdout(&output).contains("TESTING MODE"));
}
