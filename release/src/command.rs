//! External process invocation.
//!
//! The toolchain and the merge utility are both reached through the
//! [`CommandExecutor`] capability so the pipeline can be driven by a fake in
//! tests without a PlatformIO installation.

use crate::error::{ReleaseError, Result};
use camino::Utf8Path;
use log::trace;
use std::process::{Command, Output};

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs `program` with `args` in the directory `cwd` and returns the
    /// captured output. Blocks until the process exits.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use porkchop_release::command::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("pio", &["--version".to_owned()], Utf8Path::new("."))?;
    /// assert!(output.status.success());
    /// # Ok::<(), porkchop_release::error::ReleaseError>(())
    /// ```
    fn run(&self, program: &str, args: &[String], cwd: &Utf8Path) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &str, args: &[String], cwd: &Utf8Path) -> Result<Output> {
        trace!("running {program} {} in {cwd}", args.join(" "));
        Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(ReleaseError::from)
    }
}

/// Render a program and its arguments as a single display line.
///
/// Arguments containing whitespace are quoted so the line can be pasted into
/// a shell when reproducing a failure by hand.
#[must_use]
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_owned();
    for arg in args {
        line.push(' ');
        if arg.chars().any(char::is_whitespace) {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Return the trimmed standard error of a failed process, or `None` if the
/// process exited successfully.
///
/// Falls back to stdout when stderr is empty, since some tools report
/// errors there.
#[must_use]
pub fn failure_text(output: &Output) -> Option<String> {
    if output.status.success() {
        return None;
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_owned()
    } else {
        stderr.trim().to_owned()
    };

    if text.is_empty() {
        Some(format!("process exited with {}", output.status))
    } else {
        Some(text)
    }
}
