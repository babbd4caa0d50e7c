//! Version-qualified images for the two flashing channels.
//!
//! - The upgrade image is the bare application firmware. It is flashed at
//!   `0x10000` by esptool-js, which leaves NVS (and the pig's XP) intact, so it
//!   must not contain the bootloader or partition table.
//! - The full-install image merges all three images from offset `0x0` for
//!   M5Burner's direct flash mode.

use crate::artifacts::{ArtifactKind, BuildArtifactSet};
use crate::command::{CommandExecutor, failure_text};
use crate::config::MergeSettings;
use crate::error::{ReleaseError, Result};
use crate::flash::{MERGE_PROGRAM, merge_args};
use crate::naming::ReleaseNames;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;
use std::io;

/// Writes the upgrade and full-install images into the output directory.
pub struct Stager<'a> {
    executor: &'a dyn CommandExecutor,
    project_root: Utf8PathBuf,
    output_dir: Utf8PathBuf,
    names: ReleaseNames,
    merge: MergeSettings,
}

impl<'a> Stager<'a> {
    /// Create a stager writing into `output_dir`.
    ///
    /// The merge utility is run from `project_root`.
    #[must_use]
    pub fn new(
        executor: &'a dyn CommandExecutor,
        project_root: &Utf8Path,
        output_dir: &Utf8Path,
        names: ReleaseNames,
        merge: MergeSettings,
    ) -> Self {
        Self {
            executor,
            project_root: project_root.to_owned(),
            output_dir: output_dir.to_owned(),
            names,
            merge,
        }
    }

    /// Copy the firmware image to `firmware_v<version>.bin`.
    ///
    /// The copy is written beside the destination and renamed into place, so
    /// a failed copy never leaves a truncated image under the final name.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ArtifactMissing`] if the firmware image is gone,
    /// or [`ReleaseError::StagingFailure`] if the copy fails.
    pub fn stage_upgrade(&self, artifacts: &BuildArtifactSet) -> Result<Utf8PathBuf> {
        let firmware = artifacts.get(ArtifactKind::Firmware);
        firmware.verify()?;

        let dest = self.output_dir.join(self.names.upgrade_image());
        discard(&dest)?;
        let partial = partial_path(&dest);
        let copied = fs::copy(&firmware.path, &partial)
            .and_then(|_| fs::rename(&partial, &dest))
            .map_err(|e| ReleaseError::StagingFailure {
                reason: format!("failed to copy {} to {dest}: {e}", firmware.path),
            });
        if let Err(e) = copied {
            discard_quietly(&partial);
            return Err(e);
        }

        debug!("staged upgrade image {dest}");
        Ok(dest)
    }

    /// Merge bootloader, partition table, and firmware into
    /// `<stem>_v<version>_m5burner.bin`.
    ///
    /// Any image already at the destination is removed first, and whatever the
    /// merge utility wrote is removed again if the merge fails.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ArtifactMissing`] if any input image is gone,
    /// [`ReleaseError::StagingFailure`] if a stale image cannot be removed, or
    /// [`ReleaseError::MergeFailure`] if the merge utility fails or exits
    /// successfully without writing the output.
    pub fn stage_merged(&self, artifacts: &BuildArtifactSet) -> Result<Utf8PathBuf> {
        artifacts.verify()?;

        let dest = self.output_dir.join(self.names.merged_image());
        discard(&dest)?;
        let args = merge_args(&self.merge, &dest, artifacts);
        let merged = self
            .executor
            .run(MERGE_PROGRAM, &args, &self.project_root)
            .and_then(|output| match failure_text(&output) {
                Some(stderr) => Err(ReleaseError::MergeFailure { stderr }),
                None if !dest.is_file() => Err(ReleaseError::MergeFailure {
                    stderr: format!(
                        "merge utility reported success but produced no output at {dest}"
                    ),
                }),
                None => Ok(()),
            });
        if let Err(e) = merged {
            discard_quietly(&dest);
            return Err(e);
        }

        debug!("staged merged image {dest}");
        Ok(dest)
    }
}

/// Sibling path a deliverable is written to before being renamed into place.
#[must_use]
pub(crate) fn partial_path(dest: &Utf8Path) -> Utf8PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_owned();
    name.push_str(".partial");
    dest.with_file_name(name)
}

/// Remove a file left at `path` by an earlier run.
///
/// # Errors
///
/// Returns [`ReleaseError::StagingFailure`] if the file exists and cannot be
/// removed.
pub(crate) fn discard(path: &Utf8Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("removed stale {path}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ReleaseError::StagingFailure {
            reason: format!("failed to remove stale {path}: {e}"),
        }),
    }
}

/// Remove a partial output after a failed step, logging rather than masking
/// the original error.
pub(crate) fn discard_quietly(path: &Utf8Path) {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            warn!("failed to remove partial output {path}: {e}");
        }
        _ => {}
    }
}
