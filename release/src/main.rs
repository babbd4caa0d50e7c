//! PORKCHOP release CLI entrypoint.
//!
//! Builds the firmware and writes the upgrade image, the merged full-install
//! image, and the M5Burner catalog package. Exits 0 on success and 1 after
//! printing the error on any failure.

use camino::Utf8PathBuf;
use clap::Parser;
use porkchop_release::cli::Cli;
use porkchop_release::command::SystemCommandExecutor;
use porkchop_release::error::{ReleaseError, Result};
use porkchop_release::output::{Prefix, prefixed, write_stderr_line};
use porkchop_release::pipeline::{ReleaseContext, run_dry, run_release};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let cwd = current_dir()?;
    let config = cli.release_config(&cwd)?;

    if cli.dry_run {
        return run_dry(&config, stderr);
    }

    let context = ReleaseContext {
        config: &config,
        verbosity: cli.verbosity,
        quiet: cli.quiet,
    };
    run_release(&context, &SystemCommandExecutor, stderr)?;
    Ok(())
}

fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| ReleaseError::Io(e.into_io_error()))
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, prefixed(Prefix::Error, err));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = ReleaseError::VersionKeyMissing {
            path: Utf8PathBuf::from("platformio.ini"),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert_eq!(
            stderr_text,
            "[!] could not find custom_version in platformio.ini\n"
        );
    }

    #[test]
    fn dry_run_with_missing_project_reports_config_error() {
        let cli = Cli {
            project_root: Some(Utf8PathBuf::from("/nonexistent/porkchop")),
            dry_run: true,
            ..Cli::default()
        };

        let mut stderr = Vec::new();
        let err = run(&cli, &mut stderr).expect_err("no project");
        assert!(matches!(err, ReleaseError::ConfigNotFound { .. }));
    }
}
