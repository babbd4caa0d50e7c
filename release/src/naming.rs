//! Naming policy for release deliverables.
//!
//! Every output filename embeds the resolved version verbatim:
//!
//! - `firmware_v<version>.bin` (upgrade image)
//! - `<stem>_v<version>_m5burner.bin` (full-install image)
//! - `<stem>_v<version>_m5burner.zip` (catalog package)
//!
//! The catalog staging directory follows the same scheme with a `_pkg` suffix.

use crate::version::VersionToken;
use camino::{Utf8Path, Utf8PathBuf};

/// Name of the manifest file at the root of the catalog package.
pub const MANIFEST_FILENAME: &str = "m5burner.json";

/// Deterministic filenames for one release.
///
/// # Examples
///
/// ```
/// use porkchop_release::naming::ReleaseNames;
/// use porkchop_release::version::VersionToken;
///
/// let version: VersionToken = "0.1.8b-PSTH".parse().expect("valid version");
/// let names = ReleaseNames::new("porkchop", &version);
/// assert_eq!(names.upgrade_image(), "firmware_v0.1.8b-PSTH.bin");
/// assert_eq!(names.merged_image(), "porkchop_v0.1.8b-PSTH_m5burner.bin");
/// assert_eq!(names.catalog_archive(), "porkchop_v0.1.8b-PSTH_m5burner.zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNames {
    stem: String,
    version: VersionToken,
}

impl ReleaseNames {
    /// Create the naming policy for a product stem and version.
    #[must_use]
    pub fn new(stem: &str, version: &VersionToken) -> Self {
        Self {
            stem: stem.to_owned(),
            version: version.clone(),
        }
    }

    /// Return the version component.
    #[must_use]
    pub fn version(&self) -> &VersionToken {
        &self.version
    }

    /// Upgrade-only firmware image, flashed at `0x10000`.
    #[must_use]
    pub fn upgrade_image(&self) -> String {
        format!("firmware_v{}.bin", self.version)
    }

    /// Merged full-install image, flashed at `0x0`.
    #[must_use]
    pub fn merged_image(&self) -> String {
        format!("{}_v{}_m5burner.bin", self.stem, self.version)
    }

    /// Catalog package archive.
    #[must_use]
    pub fn catalog_archive(&self) -> String {
        format!("{}_v{}_m5burner.zip", self.stem, self.version)
    }

    /// Ephemeral staging directory used while assembling the archive.
    #[must_use]
    pub fn staging_dir(&self) -> String {
        format!("{}_v{}_m5burner_pkg", self.stem, self.version)
    }

    /// Paths of the three deliverables under `output_dir`.
    #[must_use]
    pub fn deliverables(&self, output_dir: &Utf8Path) -> [Utf8PathBuf; 3] {
        [
            output_dir.join(self.upgrade_image()),
            output_dir.join(self.merged_image()),
            output_dir.join(self.catalog_archive()),
        ]
    }
}
