//! `jarmod` CLI entrypoint.
//!
//! Validates the arguments, loads the descriptor, locates a JDK, and
//! modularizes every declared JAR found in the source directory, reporting
//! the counts and elapsed time when done.

use clap::Parser;
use jarmod_modularizer::cli::Cli;
use jarmod_modularizer::compiler::Javac;
use jarmod_modularizer::error::Result;
use jarmod_modularizer::logging;
use jarmod_modularizer::output::{
    Outcome, error_line, write_banner, write_report, write_stderr_line,
};
use jarmod_modularizer::run::{RunPlan, RunSummary};
use jarmod_modularizer::toolchain::Jdk;
use std::io::Write;
use std::time::{Duration, Instant};

/// Exit status when the run completed but some archives failed.
const PARTIAL_FAILURE_EXIT_CODE: i32 = 2;

fn main() {
    let cli = Cli::parse();
    logging::init(logging::level_for(cli.verbosity, cli.quiet));

    let mut stderr = std::io::stderr();
    let started = Instant::now();
    if !cli.quiet {
        write_banner(&mut stderr);
    }
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, started.elapsed(), &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<RunSummary> {
    // Step 1: Check the paths given on the command line
    let config = cli.validate()?;

    // Step 2: Load the descriptor and list the archives
    let plan = RunPlan::prepare(config)?;

    // Step 3: Locate the JDK
    let jdk = Jdk::from_env(cli.jdk_home.as_deref())?;
    if !cli.quiet {
        write_stderr_line(stderr, format!("[INFO] Using JDK: {}", jdk.home()));
        write_stderr_line(stderr, "");
    }

    // Step 4: Modularize in dependency order
    plan.run(&Javac::new(&jdk), stderr)
}

fn exit_code_for_run_result(
    result: Result<RunSummary>,
    elapsed: Duration,
    stderr: &mut dyn Write,
) -> i32 {
    match result {
        Ok(summary) => {
            let outcome = Outcome::of(&summary);
            write_report(stderr, outcome, &summary, elapsed);
            if outcome == Outcome::Success {
                0
            } else {
                PARTIAL_FAILURE_EXIT_CODE
            }
        }
        Err(err) => {
            write_stderr_line(stderr, error_line(&err));
            write_report(stderr, Outcome::Fatal, &RunSummary::default(), elapsed);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use jarmod_modularizer::error::ModularizerError;
    use rstest::rstest;

    fn stderr_text(stderr: Vec<u8>) -> String {
        String::from_utf8(stderr).expect("stderr was not UTF-8")
    }

    #[rstest]
    #[case::clean(RunSummary { modularized: 3, errors: 0, skipped: 0 }, 0, "SUCCESSFUL!!")]
    #[case::skips_only(RunSummary { modularized: 1, errors: 0, skipped: 2 }, 0, "SUCCESSFUL!!")]
    #[case::partial(RunSummary { modularized: 1, errors: 1, skipped: 0 }, 2, "non-fatal errors")]
    fn exit_code_for_completed_runs(
        #[case] summary: RunSummary,
        #[case] expected_code: i32,
        #[case] expected_status: &str,
    ) {
        let mut stderr = Vec::new();
        let exit_code =
            exit_code_for_run_result(Ok(summary), Duration::from_millis(1_500), &mut stderr);
        assert_eq!(exit_code, expected_code);

        let text = stderr_text(stderr);
        assert!(text.contains(expected_status));
        assert!(text.contains("modularized in 1.500s"));
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = ModularizerError::SourceMissing {
            path: Utf8PathBuf::from("/nowhere/lib"),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), Duration::ZERO, &mut stderr);
        assert_eq!(exit_code, 1);

        let text = stderr_text(stderr);
        assert!(text.contains("[ERROR] source directory does not exist (/nowhere/lib)"));
        assert!(text.contains("Process finished with ERROR"));
        assert!(text.contains("0 JARs modularized"));
    }

    #[test]
    fn run_stops_at_argument_validation() {
        let cli = Cli::parse_from(["jarmod", "/nowhere/modules.json", "/nowhere/lib"]);
        let mut stderr = Vec::new();

        let err = run(&cli, &mut stderr).expect_err("descriptor is missing");

        assert!(matches!(err, ModularizerError::DescriptorMissing { .. }));
        assert!(stderr.is_empty());
    }
}
