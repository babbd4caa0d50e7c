//! Error types for the release pipeline.
//!
//! Every variant is fatal for the run that raised it. The messages are the
//! only diagnostic an operator sees, so each one names the failing stage and
//! carries any captured output from the external tool involved.

use crate::artifacts::ArtifactKind;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while producing a release.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A configuration file required by the run does not exist.
    #[error("{path} not found - are you in the right directory?")]
    ConfigNotFound {
        /// Path where the file was expected.
        path: Utf8PathBuf,
    },

    /// The project configuration exists but declares no `custom_version`.
    #[error("could not find custom_version in {path}")]
    VersionKeyMissing {
        /// Path to the configuration file that was searched.
        path: Utf8PathBuf,
    },

    /// The external toolchain exited unsuccessfully.
    #[error("toolchain {step} step failed: {stderr}")]
    ToolchainFailure {
        /// Which toolchain step failed (`clean` or `build`).
        step: &'static str,
        /// Captured standard error of the toolchain process.
        stderr: String,
    },

    /// A build artifact is absent or empty where the toolchain should have
    /// left it.
    #[error("{kind} not found or empty at {path}")]
    ArtifactMissing {
        /// Which artifact is missing.
        kind: ArtifactKind,
        /// Path where the artifact was expected.
        path: Utf8PathBuf,
    },

    /// The binary merge utility failed to produce the full-install image.
    #[error("binary merge failed: {stderr}")]
    MergeFailure {
        /// Captured standard error of the merge process, or a description of
        /// the missing output.
        stderr: String,
    },

    /// Building the catalog staging tree failed.
    #[error("staging failed: {reason}")]
    StagingFailure {
        /// Description of the staging failure.
        reason: String,
    },

    /// Writing the catalog archive failed.
    #[error("packaging failed: {reason}")]
    PackagingFailure {
        /// Description of the archive failure.
        reason: String,
    },

    /// A product metadata override file could not be parsed.
    #[error("invalid metadata file {path}: {reason}")]
    InvalidMetadata {
        /// Path to the invalid file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`ReleaseError`].
pub type Result<T> = std::result::Result<T, ReleaseError>;
