//! Console output for the release CLI.
//!
//! All operator feedback goes to one writer (stderr in the binary) as lines
//! tagged with a categorical prefix:
//!
//! | Prefix | Meaning |
//! |--------|---------|
//! | `[*]`  | plain   |
//! | `[+]`  | success |
//! | `[!]`  | error   |
//! | `[>]`  | progress |

use camino::Utf8Path;
use std::fmt;
use std::io::Write;

const RULE_WIDTH: usize = 60;

/// Banner printed at the start of a run.
pub const BANNER: &str = r"
 ██▓███   ▒█████   ██▀███   ██ ▄█▀ ▄████▄   ██░ ██  ▒█████   ██▓███
▓██░  ██▒▒██▒  ██▒▓██ ▒ ██▒ ██▄█▒ ▒██▀ ▀█  ▓██░ ██▒▒██▒  ██▒▓██░  ██▒
▓██░ ██▓▒▒██░  ██▒▓██ ░▄█ ▒▓███▄░ ▒▓█    ▄ ▒██▀▀██░▒██░  ██▒▓██░ ██▓▒
▒██▄█▓▒ ▒▒██   ██░▒██▀▀█▄  ▓██ █▄ ▒▓▓▄ ▄██▒░▓█ ░██ ▒██   ██░▒██▄█▓▒ ▒
▒██▒ ░  ░░ ████▓▒░░██▓ ▒██▒▒██▒ █▄▒ ▓███▀ ░░▓█▒░██▓░ ████▓▒░▒██▒ ░  ░
▒▓▒░ ░  ░░ ▒░▒░▒░ ░ ▒▓ ░▒▓░▒ ▒▒ ▓▒░ ░▒ ▒  ░ ▒ ░░▒░▒░ ▒░▒░▒░ ▒▓▒░ ░  ░
                    RELEASE BUILD SCRIPT - OINK!
";

/// Line category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// Plain narration.
    Plain,
    /// A step completed.
    Success,
    /// A fatal error.
    Error,
    /// Progress on a running step.
    Info,
}

impl Prefix {
    /// The bracketed tag written before the message.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "[*]",
            Self::Success => "[+]",
            Self::Error => "[!]",
            Self::Info => "[>]",
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format `message` with its category prefix.
#[must_use]
pub fn prefixed(prefix: Prefix, message: impl fmt::Display) -> String {
    format!("{prefix} {message}")
}

/// Write one line, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a byte count as kilobytes with one decimal place.
///
/// # Examples
///
/// ```
/// use porkchop_release::output::format_size;
///
/// assert_eq!(format_size(1536), "1.5 KB");
/// assert_eq!(format_size(0), "0.0 KB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    let tenths = bytes.saturating_mul(10).saturating_add(512) / 1024;
    format!("{}.{} KB", tenths / 10, tenths % 10)
}

/// `Created: <name> (<size>)` for a deliverable, or just the name if its
/// size cannot be read.
#[must_use]
pub fn created_message(path: &Utf8Path) -> String {
    let name = path.file_name().unwrap_or(path.as_str());
    match std::fs::metadata(path) {
        Ok(meta) => format!("Created: {name} ({})", format_size(meta.len())),
        Err(_) => format!("Created: {name}"),
    }
}

/// Writes prefixed progress lines, honouring quiet mode.
pub struct Reporter<'a> {
    stderr: &'a mut dyn Write,
    quiet: bool,
}

impl<'a> Reporter<'a> {
    /// Create a reporter over `stderr`. When `quiet` is set nothing is
    /// written.
    #[must_use]
    pub fn new(stderr: &'a mut dyn Write, quiet: bool) -> Self {
        Self { stderr, quiet }
    }

    /// Write a line with the given prefix.
    pub fn line(&mut self, prefix: Prefix, message: impl fmt::Display) {
        if !self.quiet {
            write_stderr_line(self.stderr, prefixed(prefix, message));
        }
    }

    /// `[*]` line.
    pub fn plain(&mut self, message: impl fmt::Display) {
        self.line(Prefix::Plain, message);
    }

    /// `[+]` line.
    pub fn success(&mut self, message: impl fmt::Display) {
        self.line(Prefix::Success, message);
    }

    /// `[>]` line.
    pub fn info(&mut self, message: impl fmt::Display) {
        self.line(Prefix::Info, message);
    }

    /// Write the banner.
    pub fn banner(&mut self) {
        if !self.quiet {
            write_stderr_line(self.stderr, BANNER);
        }
    }

    /// Write a ruled section header.
    pub fn header(&mut self, title: impl fmt::Display) {
        let rule = "=".repeat(RULE_WIDTH);
        self.plain("");
        self.plain(&rule);
        self.plain(title);
        self.plain(&rule);
    }

    /// Write the `STEP n:` header for a pipeline stage.
    pub fn step(&mut self, number: usize, title: &str) {
        self.header(format_args!("STEP {number}: {title}"));
    }
}

/// One deliverable and how to flash it, for the final summary.
#[derive(Debug, Clone, Copy)]
pub struct SummaryEntry<'a> {
    /// Path of the deliverable.
    pub path: &'a Utf8Path,
    /// Flashing hint.
    pub hint: &'static str,
}

/// Summary printed after a successful run.
#[derive(Debug)]
pub struct ReleaseSummary<'a> {
    /// Version that was released.
    pub version: &'a str,
    /// Deliverables in creation order.
    pub entries: [SummaryEntry<'a>; 3],
    /// Directory holding the deliverables.
    pub output_dir: &'a Utf8Path,
}

impl ReleaseSummary<'_> {
    /// Write the summary through `reporter`.
    pub fn write(&self, reporter: &mut Reporter<'_>) {
        reporter.header("BUILD COMPLETE - OINK!");
        reporter.plain("");
        reporter.success(format_args!("Release binaries for v{}:", self.version));
        reporter.plain("");
        for entry in &self.entries {
            let name = entry.path.file_name().unwrap_or(entry.path.as_str());
            reporter.plain(format_args!("    {name}"));
            reporter.plain(format_args!("        -> {}", entry.hint));
            reporter.plain("");
        }
        reporter.info(format_args!("Files are in: {}", self.output_dir));
        reporter.plain("");
    }
}

/// Configuration information for dry-run output.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use porkchop_release::output::DryRunInfo;
///
/// let root = Utf8PathBuf::from("/work/porkchop");
/// let output = root.join("m5porkchop_builds");
/// let info = DryRunInfo {
///     project_root: &root,
///     version: "1.2.3",
///     environment: "m5cardputer",
///     output_dir: &output,
///     commands: vec!["pio run -e m5cardputer".to_owned()],
///     deliverables: vec!["firmware_v1.2.3.bin".to_owned()],
/// };
///
/// let text = info.display_text();
/// assert!(text.contains("Dry run"));
/// assert!(text.contains("firmware_v1.2.3.bin"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Project root.
    pub project_root: &'a Utf8Path,
    /// Resolved version.
    pub version: &'a str,
    /// PlatformIO environment.
    pub environment: &'a str,
    /// Output directory.
    pub output_dir: &'a Utf8Path,
    /// External commands that would run, in order.
    pub commands: Vec<String>,
    /// Deliverable filenames that would be produced.
    pub deliverables: Vec<String>,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no commands will be run and no files written".to_owned(),
            String::new(),
            format!("Project root: {}", self.project_root),
            format!("Version: {}", self.version),
            format!("Environment: {}", self.environment),
            format!("Output directory: {}", self.output_dir),
            String::new(),
            "Commands:".to_owned(),
        ];
        lines.extend(self.commands.iter().map(|c| format!("  $ {c}")));
        lines.push(String::new());
        lines.push("Deliverables:".to_owned());
        lines.extend(self.deliverables.iter().map(|d| format!("  - {d}")));
        lines.join("\n")
    }
}
