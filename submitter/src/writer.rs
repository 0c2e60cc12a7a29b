use anyhow::Context;
use std::path::Path;

/// Write a rendered job script, replacing any previous file at the same path.
///
/// The parent directory must already exist. Scenario directories are never created here.
pub fn write_job_script(path: &Path, script: &str) -> anyhow::Result<()> {
    std::fs::write(path, script)
        .with_context(|| format!("Failed to write job script {}", path.display()))
}
