use anyhow::Context;
use clap::Parser as _;
use hpc_submitter::cli::CliArgs;
use hpc_submitter::confirm::confirm;
use hpc_submitter::prelude::*;

const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    env_logger::try_init()?;

    let args = CliArgs::try_parse()?;
    log::info!("{CRATE_NAME} {CRATE_VERSION}");

    let config = Config::from_file(&args.config).with_context(|| {
        format!(
            "Cannot start without a valid configuration ({})",
            args.config.display()
        )
    })?;
    log::debug!("Loaded configuration: {config:?}");

    let (project, datafile) = if config.testing_mode() {
        let testing_run = config.testing_run();

        println!("-----------------------------------------------------");
        println!("ATTENTION: RUNNING IN TESTING MODE WITH '{}'", testing_run.project);
        println!("-----------------------------------------------------");
        if testing_run.confirm
            && !args.yes
            && !confirm(std::io::stdin().lock(), std::io::stdout(), "Continue?")?
        {
            log::info!("Testing run cancelled");
            return Ok(());
        }

        (testing_run.project.clone(), testing_run.datafile.clone())
    } else {
        let project = args.project.context("Missing argument: project name")?;
        let datafile = args
            .datafile
            .context("Missing argument: path to the parameter table")?;
        (project, datafile)
    };

    let report = submit_batch(&config, &project, &datafile)?;
    report.print_table();

    let failures = report.failures();
    if failures > 0 {
        let message = format!(
            "{failures} out of {} scenario(s) failed to submit",
            report.scenarios.len()
        );

        if args.fail_on_submission_error {
            anyhow::bail!(message);
        }
        log::warn!("{message}");
    }

    Ok(())
}
