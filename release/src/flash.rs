//! Flash layout and the merge utility command line.
//!
//! The full-install image is produced by `esptool.py merge_bin`, run through
//! PlatformIO's bundled copy so no separate esptool install is needed. The
//! segment offsets come from [`ArtifactKind::flash_offset`] and never vary
//! with the version or the image sizes.

use crate::artifacts::{ArtifactKind, BuildArtifactSet};
use crate::config::MergeSettings;
use camino::{Utf8Path, Utf8PathBuf};

/// Program used to launch the merge utility.
pub const MERGE_PROGRAM: &str = "pio";

/// Arguments that select PlatformIO's bundled esptool.
const ESPTOOL_PREFIX: [&str; 6] = ["pkg", "exec", "-p", "tool-esptoolpy", "--", "esptool.py"];

/// One image placed at a flash address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashSegment {
    /// Flash offset in bytes.
    pub offset: u32,
    /// Image written at the offset.
    pub path: Utf8PathBuf,
}

impl FlashSegment {
    /// Offset in the `0x…` form esptool accepts.
    #[must_use]
    pub fn offset_hex(&self) -> String {
        format!("{:#x}", self.offset)
    }
}

/// Segments of the full-install image in ascending offset order.
#[must_use]
pub fn flash_segments(artifacts: &BuildArtifactSet) -> Vec<FlashSegment> {
    ArtifactKind::ALL
        .into_iter()
        .map(|kind| FlashSegment {
            offset: kind.flash_offset(),
            path: artifacts.path(kind).to_owned(),
        })
        .collect()
}

/// Arguments for merging `artifacts` into `output`.
///
/// Produces
/// `pkg exec -p tool-esptoolpy -- esptool.py --chip <chip> merge_bin -o <output>
/// --flash_mode <mode> --flash_size <size> 0x0 <bootloader> 0x8000 <partitions>
/// 0x10000 <firmware>`.
#[must_use]
pub fn merge_args(
    settings: &MergeSettings,
    output: &Utf8Path,
    artifacts: &BuildArtifactSet,
) -> Vec<String> {
    let mut args: Vec<String> = ESPTOOL_PREFIX.into_iter().map(str::to_owned).collect();
    args.extend([
        "--chip".to_owned(),
        settings.chip.clone(),
        "merge_bin".to_owned(),
        "-o".to_owned(),
        output.to_string(),
        "--flash_mode".to_owned(),
        settings.flash_mode.clone(),
        "--flash_size".to_owned(),
        settings.flash_size.clone(),
    ]);
    for segment in flash_segments(artifacts) {
        args.push(segment.offset_hex());
        args.push(segment.path.into_string());
    }
    args
}
