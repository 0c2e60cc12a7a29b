use std::path::PathBuf;

use hpc_submitter::prelude::*;
use hpc_submitter::template::INJECTED_KEYS;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..")
}

#[test]
fn test_should_load_shipped_config() {
    let config =
        Config::from_file(&workspace_root().join("hpc_submit.toml")).expect("invalid config");

    assert!(!config.testing_mode());
    assert_eq!(config.queue_command(), "bsub");
    assert_eq!(config.testing_run().project, "demo_project");
}

#[test]
fn test_should_match_template_with_demo_table() {
    let root = workspace_root();
    let batch = RunBatch::from_file(&root.join("demo_project/demo_data.csv"), 10)
        .expect("invalid demo table");
    let template =
        JobTemplate::from_file(&root.join("submit_template.sh")).expect("missing template");

    template
        .check_keys(
            batch
                .header()
                .iter()
                .map(String::as_str)
                .chain(INJECTED_KEYS),
        )
        .expect("template references a column the demo table does not have");
    assert_eq!(batch.len(), 4);
}
