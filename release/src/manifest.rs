//! M5Burner catalog manifest.
//!
//! Each catalog package carries an `m5burner.json` at its root describing
//! the firmware for the M5Burner flashing tool:
//!
//! ```json
//! {
//!   "name": "PORKCHOP",
//!   "version": "0.1.8b",
//!   "description": "WiFi pentesting & wardriving tool for M5Stack Cardputer",
//!   "keywords": "wifi,wardriving,pentesting,handshake,spectrum,deauth",
//!   "author": "0ct0",
//!   "repository": "https://github.com/0ct0-porkchop/porkchop",
//!   "framework": "arduino",
//!   "firmware_category": {
//!     "PORKCHOP": {
//!       "path": "firmware",
//!       "device": ["M5Cardputer"],
//!       "default_baud": 921600
//!     }
//!   }
//! }
//! ```

use crate::config::ProductMetadata;
use crate::version::VersionToken;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Firmware category entry naming where the binaries live and which devices
/// they target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareCategory {
    /// Directory inside the package holding the address-named binaries.
    pub path: String,
    /// Compatible device models.
    pub device: Vec<String>,
    /// Default serial baud rate for flashing.
    pub default_baud: u32,
}

/// The `m5burner.json` manifest.
///
/// Built fresh for every run from the resolved version and the product
/// metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Product display name.
    pub name: String,
    /// Release version, verbatim.
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// Comma-separated keyword list.
    pub keywords: String,
    /// Author.
    pub author: String,
    /// Repository URL.
    pub repository: String,
    /// Framework tag.
    pub framework: String,
    /// Firmware categories keyed by product name.
    pub firmware_category: BTreeMap<String, FirmwareCategory>,
}

impl CatalogManifest {
    /// Build the manifest for a release of `product` at `version`.
    ///
    /// # Examples
    ///
    /// ```
    /// use porkchop_release::config::ProductMetadata;
    /// use porkchop_release::manifest::CatalogManifest;
    /// use porkchop_release::version::VersionToken;
    ///
    /// let version: VersionToken = "1.2.3".parse().expect("valid version");
    /// let manifest = CatalogManifest::new(&ProductMetadata::default(), &version);
    /// assert_eq!(manifest.version, "1.2.3");
    /// assert!(manifest.firmware_category.contains_key("PORKCHOP"));
    /// ```
    #[must_use]
    pub fn new(product: &ProductMetadata, version: &VersionToken) -> Self {
        let category = FirmwareCategory {
            path: product.firmware_path.clone(),
            device: product.devices.clone(),
            default_baud: product.default_baud,
        };

        Self {
            name: product.name.clone(),
            version: version.as_str().to_owned(),
            description: product.description.clone(),
            keywords: product.keywords.join(","),
            author: product.author.clone(),
            repository: product.repository.clone(),
            framework: product.framework.clone(),
            firmware_category: BTreeMap::from([(product.name.clone(), category)]),
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if encoding fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
