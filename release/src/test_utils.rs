//! Shared test utilities for the release crate.

use crate::artifacts::{ArtifactKind, BuildArtifactSet};
use crate::builder::{TOOLCHAIN_PROGRAM, build_args, clean_args};
use crate::command::CommandExecutor;
use crate::config::ReleaseConfig;
use crate::error::{ReleaseError, Result};
use crate::flash::{MERGE_PROGRAM, merge_args};
use crate::naming::ReleaseNames;
use crate::version::VersionToken;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program to execute (e.g., "pio").
    pub program: String,
    /// The arguments to pass to the program.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
    /// Files written when the call is made, standing in for the outputs a
    /// real tool would leave behind.
    pub creates: Vec<(Utf8PathBuf, Vec<u8>)>,
}

impl ExpectedCall {
    /// Expect `program` with `args`, returning a successful exit.
    #[must_use]
    pub fn succeeding(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_owned(),
            args,
            result: Ok(success_output()),
            creates: Vec::new(),
        }
    }

    /// Expect `program` with `args`, returning exit code 1 and `stderr`.
    #[must_use]
    pub fn failing(program: &str, args: Vec<String>, stderr: &str) -> Self {
        Self {
            program: program.to_owned(),
            args,
            result: Ok(failure_output(stderr)),
            creates: Vec::new(),
        }
    }

    /// Write `contents` to `path` (creating parent directories) when the
    /// call is made.
    #[must_use]
    pub fn creating(mut self, path: impl Into<Utf8PathBuf>, contents: &[u8]) -> Self {
        self.creates.push((path.into(), contents.to_vec()));
        self
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Replays expected command invocations in order and returns predefined
/// results, allowing tests to verify command execution without spawning
/// processes. Any unexpected or mismatched call yields
/// [`ReleaseError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    calls: RefCell<Vec<(String, Vec<String>)>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Returns every invocation received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, program: &str, args: &[String], _cwd: &Utf8Path) -> Result<Output> {
        self.calls
            .borrow_mut()
            .push((program.to_owned(), args.to_vec()));

        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ReleaseError::StubMismatch {
                message: format!("unexpected command invocation: {program} {}", args.join(" ")),
            })?;

        if call.program != program || call.args != args {
            return Err(ReleaseError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{program} {}`",
                    call.program,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }

        for (path, contents) in &call.creates {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
        }

        call.result
    }
}

/// Calls a working toolchain makes for one release of `config` at `version`.
///
/// The build call writes the three images into the build directory and the
/// merge call writes the full-install image, as the real tools would.
#[must_use]
pub fn successful_release_calls(
    config: &ReleaseConfig,
    version: &VersionToken,
) -> Vec<ExpectedCall> {
    let build_dir = config.build_dir();
    let names = ReleaseNames::new(&config.product.stem, version);
    let merged = config.output_path().join(names.merged_image());
    let artifacts = BuildArtifactSet::locate(&build_dir);

    let mut build = ExpectedCall::succeeding(TOOLCHAIN_PROGRAM, build_args(&config.environment));
    for kind in ArtifactKind::ALL {
        build = build.creating(
            build_dir.join(kind.build_filename()),
            format!("{kind} image").as_bytes(),
        );
    }

    vec![
        ExpectedCall::succeeding(TOOLCHAIN_PROGRAM, clean_args(&config.environment)),
        build,
        ExpectedCall::succeeding(MERGE_PROGRAM, merge_args(&config.merge, &merged, &artifacts))
            .creating(merged, b"merged image"),
    ]
}
