//! Build artifacts produced by the toolchain.
//!
//! The ESP32-S3 build emits three images. Each has a fixed flash offset that
//! the ROM bootloader and the second-stage bootloader expect; writing any of
//! them elsewhere yields a device that does not boot.

use crate::error::{ReleaseError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// One of the three images produced by a firmware build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Second-stage bootloader, flashed at `0x0`.
    Bootloader,
    /// Partition table, flashed at `0x8000`.
    PartitionTable,
    /// Application firmware, flashed at `0x10000`.
    Firmware,
}

impl ArtifactKind {
    /// All kinds in flash-offset order.
    pub const ALL: [Self; 3] = [Self::Bootloader, Self::PartitionTable, Self::Firmware];

    /// Filename the toolchain writes this artifact to.
    #[must_use]
    pub const fn build_filename(self) -> &'static str {
        match self {
            Self::Bootloader => "bootloader.bin",
            Self::PartitionTable => "partitions.bin",
            Self::Firmware => "firmware.bin",
        }
    }

    /// Flash address this image must be written to.
    #[must_use]
    pub const fn flash_offset(self) -> u32 {
        match self {
            Self::Bootloader => 0x0,
            Self::PartitionTable => 0x8000,
            Self::Firmware => 0x10000,
        }
    }

    /// Flash offset formatted the way esptool and M5Burner spell it.
    #[must_use]
    pub fn offset_hex(self) -> String {
        format!("{:#x}", self.flash_offset())
    }

    /// Address-qualified filename used inside the catalog package, for
    /// example `bootloader_0x0.bin`. The firmware image takes the product
    /// stem instead of a fixed name.
    #[must_use]
    pub fn catalog_filename(self, product_stem: &str) -> String {
        let base = match self {
            Self::Bootloader => "bootloader",
            Self::PartitionTable => "partitions",
            Self::Firmware => product_stem,
        };
        format!("{base}_{}.bin", self.offset_hex())
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bootloader => "bootloader",
            Self::PartitionTable => "partition table",
            Self::Firmware => "firmware",
        };
        f.write_str(label)
    }
}

/// Expected location of a single build artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// Which image this is.
    pub kind: ArtifactKind,
    /// Where the toolchain leaves it.
    pub path: Utf8PathBuf,
}

impl BuildArtifact {
    /// Returns `true` if the file exists and has at least one byte.
    #[must_use]
    pub fn is_present(&self) -> bool {
        std::fs::metadata(&self.path).is_ok_and(|m| m.is_file() && m.len() > 0)
    }

    /// Confirm the artifact is present.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ArtifactMissing`] naming the expected path when
    /// the file is absent or empty.
    pub fn verify(&self) -> Result<()> {
        if self.is_present() {
            Ok(())
        } else {
            Err(ReleaseError::ArtifactMissing {
                kind: self.kind,
                path: self.path.clone(),
            })
        }
    }
}

/// The bootloader, partition table, and firmware images of one build.
///
/// The pipeline treats these files as read-only inputs; later stages only
/// copy them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifactSet {
    bootloader: BuildArtifact,
    partitions: BuildArtifact,
    firmware: BuildArtifact,
}

impl BuildArtifactSet {
    /// Describe the artifacts expected under a profile's build directory.
    ///
    /// This does not touch the filesystem.
    #[must_use]
    pub fn locate(build_dir: &Utf8Path) -> Self {
        let artifact = |kind: ArtifactKind| BuildArtifact {
            kind,
            path: build_dir.join(kind.build_filename()),
        };
        Self {
            bootloader: artifact(ArtifactKind::Bootloader),
            partitions: artifact(ArtifactKind::PartitionTable),
            firmware: artifact(ArtifactKind::Firmware),
        }
    }

    /// Confirm all three artifacts are present, checking in flash order.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ArtifactMissing`] for the first absent or
    /// empty artifact.
    pub fn verify(&self) -> Result<()> {
        self.iter().try_for_each(BuildArtifact::verify)
    }

    /// Return the artifact of the given kind.
    #[must_use]
    pub const fn get(&self, kind: ArtifactKind) -> &BuildArtifact {
        match kind {
            ArtifactKind::Bootloader => &self.bootloader,
            ArtifactKind::PartitionTable => &self.partitions,
            ArtifactKind::Firmware => &self.firmware,
        }
    }

    /// Path of the given artifact.
    #[must_use]
    pub fn path(&self, kind: ArtifactKind) -> &Utf8Path {
        &self.get(kind).path
    }

    /// Iterate the artifacts in flash-offset order.
    pub fn iter(&self) -> impl Iterator<Item = &BuildArtifact> {
        ArtifactKind::ALL.into_iter().map(|kind| self.get(kind))
    }
}
