//! PlatformIO build orchestration.
//!
//! A release build always starts from a clean tree: the environment is
//! cleaned, compiled, and the three expected images are checked before any
//! packaging begins.

use crate::artifacts::BuildArtifactSet;
use crate::command::{CommandExecutor, failure_text};
use crate::error::{ReleaseError, Result};
use camino::Utf8PathBuf;
use log::debug;

/// Program used to drive the firmware toolchain.
pub const TOOLCHAIN_PROGRAM: &str = "pio";

/// Configuration for the build process.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; the toolchain runs here.
    pub project_root: Utf8PathBuf,
    /// PlatformIO environment to build.
    pub environment: String,
    /// Directory the environment's images are written to.
    pub build_dir: Utf8PathBuf,
}

/// Arguments for `pio run -t clean -e <environment>`.
#[must_use]
pub fn clean_args(environment: &str) -> Vec<String> {
    ["run", "-t", "clean", "-e", environment]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Arguments for `pio run -e <environment>`.
#[must_use]
pub fn build_args(environment: &str) -> Vec<String> {
    ["run", "-e", environment]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Drives the toolchain for one environment.
pub struct Builder<'a> {
    executor: &'a dyn CommandExecutor,
    config: BuildConfig,
}

impl<'a> Builder<'a> {
    /// Create a new builder with the given executor and configuration.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, config: BuildConfig) -> Self {
        Self { executor, config }
    }

    /// Remove previous build output for the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ToolchainFailure`] if the clean step exits
    /// unsuccessfully.
    pub fn clean(&self) -> Result<()> {
        self.run_step("clean", &clean_args(&self.config.environment))
    }

    /// Compile the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ToolchainFailure`] if the build step exits
    /// unsuccessfully.
    pub fn compile(&self) -> Result<()> {
        self.run_step("build", &build_args(&self.config.environment))
    }

    /// Clean, compile, and confirm the three images exist.
    ///
    /// Compilation is not attempted if cleaning fails.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ToolchainFailure`] if either toolchain step
    /// fails, or [`ReleaseError::ArtifactMissing`] if the toolchain reported
    /// success but an image is absent or empty.
    pub fn build(&self) -> Result<BuildArtifactSet> {
        self.clean()?;
        self.compile()?;
        self.artifacts()
    }

    /// Locate the environment's images and check each is present.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ArtifactMissing`] for the first image that is
    /// absent or empty.
    pub fn artifacts(&self) -> Result<BuildArtifactSet> {
        let artifacts = BuildArtifactSet::locate(&self.config.build_dir);
        artifacts.verify()?;
        Ok(artifacts)
    }

    fn run_step(&self, step: &'static str, args: &[String]) -> Result<()> {
        debug!("toolchain {step}: {TOOLCHAIN_PROGRAM} {}", args.join(" "));
        let output = self
            .executor
            .run(TOOLCHAIN_PROGRAM, args, &self.config.project_root)?;

        match failure_text(&output) {
            None => Ok(()),
            Some(stderr) => Err(ReleaseError::ToolchainFailure { step, stderr }),
        }
    }
}
