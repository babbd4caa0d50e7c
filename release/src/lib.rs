//! PORKCHOP release packaging library.
//!
//! This crate turns a PlatformIO firmware project into three versioned
//! deliverables: a bare upgrade image, a merged full-install image, and an
//! M5Burner catalog package. It is used by the `porkchop-release` binary and
//! can be driven programmatically with a fake [`command::CommandExecutor`]
//! for testing.
//!
//! # Modules
//!
//! - [`archive`] - Deterministic zip writing
//! - [`artifacts`] - Build artifact kinds, locations, and verification
//! - [`builder`] - PlatformIO clean and build orchestration
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - External process capability
//! - [`config`] - Release configuration and product metadata
//! - [`error`] - Error taxonomy
//! - [`flash`] - Flash offsets and merge utility arguments
//! - [`manifest`] - `m5burner.json` catalog manifest
//! - [`naming`] - Version-qualified output filenames
//! - [`output`] - Prefixed console output
//! - [`packager`] - Catalog package staging and archiving
//! - [`pipeline`] - End-to-end release sequencing
//! - [`stager`] - Upgrade and full-install image staging
//! - [`version`] - Version token resolution

pub mod archive;
pub mod artifacts;
pub mod builder;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod flash;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod packager;
pub mod pipeline;
pub mod stager;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod version;
