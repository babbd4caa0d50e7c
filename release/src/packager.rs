//! M5Burner catalog packaging.
//!
//! A catalog package is a zip holding `m5burner.json` and a `firmware/`
//! directory of address-named images:
//!
//! ```text
//! m5burner.json
//! firmware/bootloader_0x0.bin
//! firmware/partitions_0x8000.bin
//! firmware/porkchop_0x10000.bin
//! ```
//!
//! The package is assembled in a [`StagingTree`] next to the output files and
//! zipped from there. The staging tree never outlives the call, whether the
//! archive was written or not.

use crate::archive::write_zip;
use crate::artifacts::BuildArtifactSet;
use crate::config::ProductMetadata;
use crate::error::{ReleaseError, Result};
use crate::manifest::CatalogManifest;
use crate::naming::{MANIFEST_FILENAME, ReleaseNames};
use crate::stager::{discard, discard_quietly, partial_path};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;

/// A scratch directory removed when the guard goes out of scope.
///
/// Anything already at the path (left by an interrupted run) is removed
/// before the tree is created, so repeated runs start from an empty tree.
#[derive(Debug)]
pub struct StagingTree {
    root: Utf8PathBuf,
    removed: bool,
}

impl StagingTree {
    /// Create an empty staging directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::StagingFailure`] if a stale entry cannot be
    /// removed or the new directory cannot be created.
    pub fn create(root: &Utf8Path) -> Result<Self> {
        if root.is_dir() {
            debug!("removing stale staging directory {root}");
            fs::remove_dir_all(root).map_err(|e| ReleaseError::StagingFailure {
                reason: format!("failed to remove stale staging directory {root}: {e}"),
            })?;
        } else if root.symlink_metadata().is_ok() {
            debug!("removing stale file at staging path {root}");
            fs::remove_file(root).map_err(|e| ReleaseError::StagingFailure {
                reason: format!("failed to remove stale file at {root}: {e}"),
            })?;
        }

        fs::create_dir_all(root).map_err(|e| ReleaseError::StagingFailure {
            reason: format!("failed to create staging directory {root}: {e}"),
        })?;

        Ok(Self {
            root: root.to_owned(),
            removed: false,
        })
    }

    /// Path of the staging directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Remove the staging directory now, reporting failure.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::StagingFailure`] if the directory cannot be
    /// removed.
    pub fn remove(mut self) -> Result<()> {
        self.removed = true;
        fs::remove_dir_all(&self.root).map_err(|e| ReleaseError::StagingFailure {
            reason: format!("failed to remove staging directory {}: {e}", self.root),
        })
    }
}

impl Drop for StagingTree {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.root) {
            warn!("failed to clean up staging directory {}: {e}", self.root);
        }
    }
}

/// Output produced by [`CatalogPackager::package`].
#[derive(Debug, Clone)]
pub struct PackageOutput {
    /// Path to the created zip.
    pub archive_path: Utf8PathBuf,
    /// Entry names inside the zip, in write order.
    pub entries: Vec<String>,
    /// The manifest written into the package.
    pub manifest: CatalogManifest,
}

/// Assembles the catalog zip for one release.
pub struct CatalogPackager<'a> {
    output_dir: &'a Utf8Path,
    names: &'a ReleaseNames,
    product: &'a ProductMetadata,
}

impl<'a> CatalogPackager<'a> {
    /// Create a packager writing into `output_dir`.
    #[must_use]
    pub fn new(
        output_dir: &'a Utf8Path,
        names: &'a ReleaseNames,
        product: &'a ProductMetadata,
    ) -> Self {
        Self {
            output_dir,
            names,
            product,
        }
    }

    /// Path of the staging directory used while packaging.
    #[must_use]
    pub fn staging_path(&self) -> Utf8PathBuf {
        self.output_dir.join(self.names.staging_dir())
    }

    /// Path the archive is written to.
    #[must_use]
    pub fn archive_path(&self) -> Utf8PathBuf {
        self.output_dir.join(self.names.catalog_archive())
    }

    /// Build the catalog archive from the build artifacts.
    ///
    /// The zip is written under a temporary name and renamed into place once
    /// complete. An archive left by an earlier run is removed first, so a
    /// failed run never leaves a catalog package behind.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ArtifactMissing`] if a build image is gone,
    /// [`ReleaseError::StagingFailure`] if the staging tree cannot be
    /// assembled or removed, and [`ReleaseError::PackagingFailure`] if the zip
    /// cannot be written. The staging tree is removed on every path.
    pub fn package(&self, artifacts: &BuildArtifactSet) -> Result<PackageOutput> {
        artifacts.verify()?;

        let archive_path = self.archive_path();
        discard(&archive_path)?;

        let staging = StagingTree::create(&self.staging_path())?;
        let manifest = self.populate(staging.root(), artifacts)?;

        let partial = partial_path(&archive_path);
        let written = write_zip(staging.root(), &partial)
            .map_err(|e| e.to_string())
            .and_then(|entries| {
                fs::rename(&partial, &archive_path)
                    .map(|()| entries)
                    .map_err(|e| e.to_string())
            });
        let entries = match written {
            Ok(entries) => entries,
            Err(reason) => {
                discard_quietly(&partial);
                return Err(ReleaseError::PackagingFailure {
                    reason: format!("failed to write {archive_path}: {reason}"),
                });
            }
        };

        staging.remove()?;

        Ok(PackageOutput {
            archive_path,
            entries,
            manifest,
        })
    }

    /// Copy the address-named images and write the manifest into `root`.
    fn populate(&self, root: &Utf8Path, artifacts: &BuildArtifactSet) -> Result<CatalogManifest> {
        let firmware_dir = root.join(&self.product.firmware_path);
        fs::create_dir_all(&firmware_dir).map_err(|e| ReleaseError::StagingFailure {
            reason: format!("failed to create {firmware_dir}: {e}"),
        })?;

        for artifact in artifacts.iter() {
            let dest = firmware_dir.join(artifact.kind.catalog_filename(&self.product.stem));
            fs::copy(&artifact.path, &dest).map_err(|e| ReleaseError::StagingFailure {
                reason: format!("failed to copy {} to {dest}: {e}", artifact.path),
            })?;
        }

        let manifest = CatalogManifest::new(self.product, self.names.version());
        let json = manifest
            .to_json()
            .map_err(|e| ReleaseError::StagingFailure {
                reason: format!("failed to serialize {MANIFEST_FILENAME}: {e}"),
            })?;
        let manifest_path = root.join(MANIFEST_FILENAME);
        fs::write(&manifest_path, json).map_err(|e| ReleaseError::StagingFailure {
            reason: format!("failed to write {manifest_path}: {e}"),
        })?;

        Ok(manifest)
    }
}

#[cfg(test)]
#[path = "packager_tests.rs"]
mod tests;
