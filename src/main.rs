use clap::Parser;
use git_fresh_rust::config::Options;
use git_fresh_rust::freshen::{self, FreshenOutcome};
use git_fresh_rust::output;

fn main() -> anyhow::Result<()> {
    let opts = Options::parse();
    let cwd = std::env::current_dir()?;

    output::print_run_header(&cwd, &opts.remote, &opts.root);

    let callbacks = output::RunCallbacks::new(output::create_run_progress());
    let result = freshen::run(&cwd, &opts, &callbacks);
    callbacks.finish(&result);

    match &result.outcome {
        FreshenOutcome::Success(report) => {
            output::print_report(report, &opts);
            Ok(())
        }
        FreshenOutcome::Failed(failure) => {
            output::error(&format!("failed at {:?}: {}", failure.step, failure.error));
            std::process::exit(1);
        }
    }
}
