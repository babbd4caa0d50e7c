//! Version discovery from the PlatformIO project configuration.
//!
//! The release version lives in `platformio.ini` as a `custom_version = <token>`
//! entry. The token is used verbatim in every output filename and in the
//! catalog manifest, so it is wrapped in [`VersionToken`] once resolved.

use crate::error::{ReleaseError, Result};
use camino::Utf8Path;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Matches the first `custom_version = <token>` entry on a single line.
#[expect(clippy::expect_used, reason = "the pattern is a compile-time literal")]
static CUSTOM_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"custom_version[ \t]*=[ \t]*([\w.\-]+)").expect("valid custom_version regex")
});

/// Matches a complete token made only of the permitted characters.
#[expect(clippy::expect_used, reason = "the pattern is a compile-time literal")]
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.\-]+$").expect("valid version token regex"));

/// A release version such as `0.1.8b-PSTH`.
///
/// The token is opaque: it is never split into components or compared
/// semantically, only embedded in filenames and the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionToken(String);

/// Error returned when a string is not a valid version token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version token {0:?}: expected letters, digits, '.', '-' or '_'")]
pub struct InvalidVersionToken(String);

impl VersionToken {
    /// Return the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VersionToken {
    type Err = InvalidVersionToken;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if TOKEN.is_match(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(InvalidVersionToken(s.to_owned()))
        }
    }
}

impl AsRef<str> for VersionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the first `custom_version` token from configuration text.
///
/// Returns `None` when no entry is present.
///
/// # Examples
///
/// ```
/// use porkchop_release::version::parse_version;
///
/// let ini = "[env:m5cardputer]\ncustom_version = 0.1.8b-PSTH\n";
/// let version = parse_version(ini).expect("version present");
/// assert_eq!(version.as_str(), "0.1.8b-PSTH");
/// ```
#[must_use]
pub fn parse_version(contents: &str) -> Option<VersionToken> {
    CUSTOM_VERSION
        .captures(contents)
        .and_then(|caps| caps.get(1))
        .map(|m| VersionToken(m.as_str().to_owned()))
}

/// Resolve the release version from the configuration file at `path`.
///
/// # Errors
///
/// Returns [`ReleaseError::ConfigNotFound`] if the file does not exist,
/// [`ReleaseError::VersionKeyMissing`] if it has no `custom_version` entry,
/// or [`ReleaseError::Io`] if it exists but cannot be read.
pub fn resolve_version(path: &Utf8Path) -> Result<VersionToken> {
    if !path.exists() {
        return Err(ReleaseError::ConfigNotFound {
            path: path.to_owned(),
        });
    }

    let contents = std::fs::read_to_string(path)?;
    let version = parse_version(&contents).ok_or_else(|| ReleaseError::VersionKeyMissing {
        path: path.to_owned(),
    })?;

    debug!("resolved version {version} from {path}");
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join("platformio.ini"))
            .expect("temp dir path not UTF-8");
        std::fs::write(&path, contents).expect("write config");
        path
    }

    #[rstest]
    #[case::plain("1.2.3")]
    #[case::alpha_suffix("0.1.8b")]
    #[case::hyphen_suffix("0.1.8b-PSTH")]
    #[case::underscore_suffix("0.1.8b_suffix")]
    fn parse_version_returns_token_verbatim(#[case] token: &str) {
        let contents = format!("[env]\nplatform = espressif32\ncustom_version = {token}\n");
        let version = parse_version(&contents).expect("version present");
        assert_eq!(version.as_str(), token);
    }

    #[rstest]
    #[case::no_spaces("custom_version=2.0.0\n")]
    #[case::tabs("custom_version\t=\t2.0.0\n")]
    #[case::trailing_comment("custom_version = 2.0.0 ; release\n")]
    fn parse_version_tolerates_spacing(#[case] contents: &str) {
        assert_eq!(
            parse_version(contents).map(|v| v.as_str().to_owned()),
            Some("2.0.0".to_owned())
        );
    }

    #[test]
    fn parse_version_takes_the_first_match() {
        let contents = "custom_version = 1.0.0\ncustom_version = 2.0.0\n";
        let version = parse_version(contents).expect("version present");
        assert_eq!(version.as_str(), "1.0.0");
    }

    #[test]
    fn parse_version_does_not_cross_lines() {
        let contents = "custom_version =\nbuild_flags = -DFOO\n";
        assert!(parse_version(contents).is_none());
    }

    #[test]
    fn resolve_version_reads_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(&dir, "[env:m5cardputer]\ncustom_version = 0.1.8b-PSTH\n");

        let version = resolve_version(&path).expect("version resolved");
        assert_eq!(version.to_string(), "0.1.8b-PSTH");
    }

    #[test]
    fn resolve_version_reports_missing_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::try_from(dir.path().join("platformio.ini"))
            .expect("temp dir path not UTF-8");

        let err = resolve_version(&path).expect_err("missing file must fail");
        assert!(matches!(err, ReleaseError::ConfigNotFound { path: p } if p == path));
    }

    #[test]
    fn resolve_version_reports_missing_key() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(&dir, "[env:m5cardputer]\nversion = 1.2.3\n");

        let err = resolve_version(&path).expect_err("missing key must fail");
        assert!(matches!(err, ReleaseError::VersionKeyMissing { .. }));
    }

    #[rstest]
    #[case::valid("1.2.3-rc_1", true)]
    #[case::space("1.2 3", false)]
    #[case::slash("1.2/3", false)]
    #[case::empty("", false)]
    fn from_str_validates_character_set(#[case] input: &str, #[case] expect_ok: bool) {
        assert_eq!(input.parse::<VersionToken>().is_ok(), expect_ok);
    }
}
