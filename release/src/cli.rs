//! CLI argument definitions for the release packager.
//!
//! Every option has a default matching the PORKCHOP project layout, so running
//! the binary with no arguments from the project root produces a release.

use crate::config::{
    DEFAULT_CONFIG_FILE, DEFAULT_ENVIRONMENT, DEFAULT_OUTPUT_DIR, ProductMetadata, ReleaseConfig,
};
use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

/// Build and package a PORKCHOP firmware release.
#[derive(Parser, Debug, Clone)]
#[command(name = "porkchop-release")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build and package a PORKCHOP firmware release.\n\n",
    "Reads custom_version from platformio.ini, runs a clean PlatformIO build, ",
    "and writes three deliverables to the output directory: a bare firmware ",
    "image for esptool-js upgrades, a merged full-install image for M5 Burner, ",
    "and an M5Burner catalog zip.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Release from the project root:\n",
    "    $ porkchop-release\n\n",
    "  Preview the commands without building:\n",
    "    $ porkchop-release --dry-run\n\n",
    "  Override catalog metadata:\n",
    "    $ porkchop-release --metadata release.toml\n",
))]
pub struct Cli {
    /// PlatformIO project root [default: current directory].
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<Utf8PathBuf>,

    /// Configuration file holding custom_version, relative to the project root.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: Utf8PathBuf,

    /// PlatformIO environment to build.
    #[arg(short, long = "env", value_name = "NAME", default_value = DEFAULT_ENVIRONMENT)]
    pub environment: String,

    /// Directory for the deliverables, relative to the project root.
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: Utf8PathBuf,

    /// TOML file overriding catalog metadata.
    #[arg(short, long, value_name = "FILE")]
    pub metadata: Option<Utf8PathBuf>,

    /// Show the plan and exit without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Echo external commands (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Default for Cli {
    /// Creates a `Cli` with every option at its default.
    ///
    /// # Examples
    ///
    /// ```
    /// use porkchop_release::cli::Cli;
    ///
    /// let cli = Cli::default();
    /// assert_eq!(cli.environment, "m5cardputer");
    /// assert!(cli.project_root.is_none());
    /// ```
    fn default() -> Self {
        Self {
            project_root: None,
            config_file: Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
            environment: DEFAULT_ENVIRONMENT.to_owned(),
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
            metadata: None,
            dry_run: false,
            verbosity: 0,
            quiet: false,
        }
    }
}

impl Cli {
    /// Build the release configuration, resolving relative paths against
    /// `cwd`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ReleaseError::ConfigNotFound`] or
    /// [`crate::error::ReleaseError::InvalidMetadata`] if a metadata override
    /// was given and cannot be loaded.
    pub fn release_config(&self, cwd: &Utf8Path) -> Result<ReleaseConfig> {
        let project_root = match &self.project_root {
            Some(root) => cwd.join(root),
            None => cwd.to_owned(),
        };

        let mut config = ReleaseConfig::new(project_root);
        config.config_file.clone_from(&self.config_file);
        config.environment.clone_from(&self.environment);
        config.output_dir.clone_from(&self.output_dir);

        if let Some(path) = &self.metadata {
            config.product = ProductMetadata::load(&cwd.join(path))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
