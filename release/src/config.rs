//! Release configuration.
//!
//! [`ReleaseConfig`] gathers every path and constant the pipeline needs. The
//! defaults reproduce the PORKCHOP release layout so the binary works with no
//! arguments; product metadata can be overridden from a TOML file.

use crate::error::{ReleaseError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Project configuration file holding `custom_version`.
pub const DEFAULT_CONFIG_FILE: &str = "platformio.ini";

/// PlatformIO environment built for release.
pub const DEFAULT_ENVIRONMENT: &str = "m5cardputer";

/// Directory the deliverables are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "m5porkchop_builds";

/// Static product description used for filenames and the catalog manifest.
///
/// Any subset of fields may be supplied in a TOML override file; the rest
/// keep their defaults.
///
/// ```toml
/// description = "Nightly build"
/// keywords = ["wifi", "nightly"]
/// default_baud = 115200
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductMetadata {
    /// Display name, also the firmware category key in the manifest.
    pub name: String,
    /// Lowercase stem used in output filenames.
    pub stem: String,
    /// Human-readable description.
    pub description: String,
    /// Catalog search keywords.
    pub keywords: Vec<String>,
    /// Author shown in the catalog.
    pub author: String,
    /// Source repository URL.
    pub repository: String,
    /// Framework tag.
    pub framework: String,
    /// Directory inside the package holding the address-named binaries.
    pub firmware_path: String,
    /// Device models the firmware runs on.
    pub devices: Vec<String>,
    /// Serial speed the flashing tool should default to.
    pub default_baud: u32,
}

impl Default for ProductMetadata {
    fn default() -> Self {
        Self {
            name: "PORKCHOP".to_owned(),
            stem: "porkchop".to_owned(),
            description: "WiFi pentesting & wardriving tool for M5Stack Cardputer".to_owned(),
            keywords: ["wifi", "wardriving", "pentesting", "handshake", "spectrum", "deauth"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            author: "0ct0".to_owned(),
            repository: "https://github.com/0ct0-porkchop/porkchop".to_owned(),
            framework: "arduino".to_owned(),
            firmware_path: "firmware".to_owned(),
            devices: vec!["M5Cardputer".to_owned()],
            default_baud: 921_600,
        }
    }
}

impl ProductMetadata {
    /// Load metadata overrides from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ConfigNotFound`] if the file does not exist
    /// and [`ReleaseError::InvalidMetadata`] if it cannot be parsed or a
    /// name-bearing field is not a single plain path component.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReleaseError::ConfigNotFound {
                path: path.to_owned(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents).map_err(|reason| ReleaseError::InvalidMetadata {
            path: path.to_owned(),
            reason,
        })
    }

    fn parse(contents: &str) -> std::result::Result<Self, String> {
        let metadata: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// `name`, `stem`, and `firmware_path` end up in file and directory names
    /// under the output directory, so each must be one normal component.
    fn validate(&self) -> std::result::Result<(), String> {
        for (field, value) in [
            ("name", &self.name),
            ("stem", &self.stem),
            ("firmware_path", &self.firmware_path),
        ] {
            if !is_single_component(value) {
                return Err(format!(
                    "{field} must be a single plain path component, got {value:?}"
                ));
            }
        }
        Ok(())
    }
}

fn is_single_component(value: &str) -> bool {
    let mut components = Utf8Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Utf8Component::Normal(part)), None) if part == value
    )
}

/// Chip and flash parameters handed to the merge utility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSettings {
    /// esptool chip identifier.
    pub chip: String,
    /// SPI flash mode.
    pub flash_mode: String,
    /// Flash size of the target device.
    pub flash_size: String,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            chip: "esp32s3".to_owned(),
            flash_mode: "dio".to_owned(),
            flash_size: "8MB".to_owned(),
        }
    }
}

/// Everything a release run needs to know.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// PlatformIO project root; external commands run here.
    pub project_root: Utf8PathBuf,
    /// Configuration file, relative to the project root unless absolute.
    pub config_file: Utf8PathBuf,
    /// PlatformIO environment (build profile) name.
    pub environment: String,
    /// Output directory, relative to the project root unless absolute.
    pub output_dir: Utf8PathBuf,
    /// Product constants.
    pub product: ProductMetadata,
    /// Merge utility parameters.
    pub merge: MergeSettings,
}

impl ReleaseConfig {
    /// Create a configuration with default settings for `project_root`.
    #[must_use]
    pub fn new(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            config_file: Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
            environment: DEFAULT_ENVIRONMENT.to_owned(),
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
            product: ProductMetadata::default(),
            merge: MergeSettings::default(),
        }
    }

    /// Absolute or project-relative path of the configuration file.
    #[must_use]
    pub fn config_path(&self) -> Utf8PathBuf {
        self.project_root.join(&self.config_file)
    }

    /// Directory the deliverables are written to.
    #[must_use]
    pub fn output_path(&self) -> Utf8PathBuf {
        self.project_root.join(&self.output_dir)
    }

    /// Directory the toolchain writes the environment's images to.
    #[must_use]
    pub fn build_dir(&self) -> Utf8PathBuf {
        self.project_root
            .join(".pio")
            .join("build")
            .join(&self.environment)
    }
}
