//! Release pipeline orchestration.
//!
//! A run is strictly sequential: resolve the version, build, stage the two
//! flashable images, then package the catalog archive. The first failure
//! stops the run; deliverables already written stay in place, but no later
//! stage is attempted.

use crate::artifacts::BuildArtifactSet;
use crate::builder::{BuildConfig, Builder, TOOLCHAIN_PROGRAM, build_args, clean_args};
use crate::command::{CommandExecutor, command_line};
use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::flash::{MERGE_PROGRAM, merge_args};
use crate::naming::ReleaseNames;
use crate::output::{
    DryRunInfo, ReleaseSummary, Reporter, SummaryEntry, created_message, write_stderr_line,
};
use crate::packager::CatalogPackager;
use crate::stager::Stager;
use crate::version::{VersionToken, resolve_version};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::io::Write;

/// Flashing hint for the upgrade image.
pub const UPGRADE_HINT: &str = "Flash at 0x10000 via esptool-js (preserves XP)";
/// Flashing hint for the full-install image.
pub const MERGED_HINT: &str = "Flash at 0x0 via M5 Burner (full install)";
/// Description of the catalog archive.
pub const CATALOG_HINT: &str = "M5Burner catalog package (m5burner.json + bins)";

/// Context for a release run.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseContext<'a> {
    /// Paths, environment, and product constants.
    pub config: &'a ReleaseConfig,
    /// Verbosity level; at 1 or above each external command is echoed.
    pub verbosity: u8,
    /// Suppress progress output.
    pub quiet: bool,
}

/// The three deliverables of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSet {
    /// Version embedded in every filename.
    pub version: VersionToken,
    /// Bare application image for upgrades.
    pub upgrade_image: Utf8PathBuf,
    /// Merged image for a full install.
    pub merged_image: Utf8PathBuf,
    /// Catalog zip for M5Burner.
    pub catalog_archive: Utf8PathBuf,
}

/// Run the full release pipeline.
///
/// Progress is written to `stderr` unless the context is quiet.
///
/// # Errors
///
/// Returns the first error raised by any stage. A configuration error means
/// no external command was run.
pub fn run_release(
    context: &ReleaseContext<'_>,
    executor: &dyn CommandExecutor,
    stderr: &mut dyn Write,
) -> Result<OutputSet> {
    let config = context.config;
    let mut reporter = Reporter::new(stderr, context.quiet);
    reporter.banner();
    reporter.plain(format_args!("Working directory: {}", config.project_root));

    let version = resolve_version(&config.config_path())?;
    reporter.success(format_args!("Building version: {version}"));

    let output_dir = prepare_output_dir(config)?;
    reporter.success(format_args!("Output directory: {output_dir}"));

    reporter.step(1, "Building firmware with PlatformIO");
    let artifacts = perform_build(context, executor, &mut reporter)?;

    let names = ReleaseNames::new(&config.product.stem, &version);
    let stager = Stager::new(
        executor,
        &config.project_root,
        &output_dir,
        names.clone(),
        config.merge.clone(),
    );

    reporter.step(2, "Copying firmware for esptool-js upgrades");
    let upgrade_image = stager.stage_upgrade(&artifacts)?;
    reporter.success(created_message(&upgrade_image));

    reporter.step(3, "Creating merged binary for M5 Burner");
    if context.verbosity > 0 {
        let dest = output_dir.join(names.merged_image());
        let args = merge_args(&config.merge, &dest, &artifacts);
        reporter.info(command_line(MERGE_PROGRAM, &args));
    }
    let merged_image = stager.stage_merged(&artifacts)?;
    reporter.success(created_message(&merged_image));

    reporter.step(4, "Packaging M5Burner catalog archive");
    let package = CatalogPackager::new(&output_dir, &names, &config.product).package(&artifacts)?;
    for entry in &package.entries {
        reporter.info(format_args!("  {entry}"));
    }
    reporter.success(created_message(&package.archive_path));

    let outputs = OutputSet {
        version,
        upgrade_image,
        merged_image,
        catalog_archive: package.archive_path,
    };

    ReleaseSummary {
        version: outputs.version.as_str(),
        entries: [
            SummaryEntry {
                path: &outputs.upgrade_image,
                hint: UPGRADE_HINT,
            },
            SummaryEntry {
                path: &outputs.merged_image,
                hint: MERGED_HINT,
            },
            SummaryEntry {
                path: &outputs.catalog_archive,
                hint: CATALOG_HINT,
            },
        ],
        output_dir: &output_dir,
    }
    .write(&mut reporter);

    Ok(outputs)
}

/// Create the output directory if it does not already exist.
///
/// # Errors
///
/// Returns [`crate::error::ReleaseError::Io`] if the directory cannot be
/// created.
pub fn prepare_output_dir(config: &ReleaseConfig) -> Result<Utf8PathBuf> {
    let output_dir = config.output_path();
    std::fs::create_dir_all(&output_dir)?;
    debug!("output directory ready at {output_dir}");
    Ok(output_dir)
}

/// Clean and compile the configured environment, then locate its images.
///
/// # Errors
///
/// Returns the toolchain or artifact error from the [`Builder`].
pub fn perform_build(
    context: &ReleaseContext<'_>,
    executor: &dyn CommandExecutor,
    reporter: &mut Reporter<'_>,
) -> Result<BuildArtifactSet> {
    let config = context.config;
    let builder = Builder::new(
        executor,
        BuildConfig {
            project_root: config.project_root.clone(),
            environment: config.environment.clone(),
            build_dir: config.build_dir(),
        },
    );

    reporter.info("Cleaning build artifacts...");
    if context.verbosity > 0 {
        reporter.info(command_line(
            TOOLCHAIN_PROGRAM,
            &clean_args(&config.environment),
        ));
    }
    builder.clean()?;

    reporter.info("Compiling (this may take a while)...");
    if context.verbosity > 0 {
        reporter.info(command_line(
            TOOLCHAIN_PROGRAM,
            &build_args(&config.environment),
        ));
    }
    builder.compile()?;

    let artifacts = builder.artifacts()?;
    reporter.success("Build successful");
    Ok(artifacts)
}

/// Describe what a run would do without running anything.
///
/// The version is still resolved so configuration errors surface.
///
/// # Errors
///
/// Returns [`crate::error::ReleaseError::ConfigNotFound`] or
/// [`crate::error::ReleaseError::VersionKeyMissing`].
pub fn plan_release(config: &ReleaseConfig) -> Result<(VersionToken, Vec<String>)> {
    let version = resolve_version(&config.config_path())?;
    let names = ReleaseNames::new(&config.product.stem, &version);
    let output_dir = config.output_path();
    let artifacts = BuildArtifactSet::locate(&config.build_dir());

    let commands = vec![
        command_line(TOOLCHAIN_PROGRAM, &clean_args(&config.environment)),
        command_line(TOOLCHAIN_PROGRAM, &build_args(&config.environment)),
        command_line(
            MERGE_PROGRAM,
            &merge_args(
                &config.merge,
                &output_dir.join(names.merged_image()),
                &artifacts,
            ),
        ),
    ];
    Ok((version, commands))
}

/// Print the dry-run plan.
///
/// Dry-run output is written even in quiet mode, since it is the only thing
/// the run produces.
///
/// # Errors
///
/// Propagates configuration errors from [`plan_release`].
pub fn run_dry(config: &ReleaseConfig, stderr: &mut dyn Write) -> Result<()> {
    let (version, commands) = plan_release(config)?;
    let names = ReleaseNames::new(&config.product.stem, &version);
    let output_dir = config.output_path();

    let info = DryRunInfo {
        project_root: &config.project_root,
        version: version.as_str(),
        environment: &config.environment,
        output_dir: &output_dir,
        commands,
        deliverables: deliverable_names(&names, &output_dir),
    };
    write_stderr_line(stderr, info.display_text());
    Ok(())
}

fn deliverable_names(names: &ReleaseNames, output_dir: &Utf8Path) -> Vec<String> {
    names
        .deliverables(output_dir)
        .iter()
        .filter_map(|path| path.file_name().map(str::to_owned))
        .collect()
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
