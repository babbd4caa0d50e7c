//! Zip archive creation for catalog packages.
//!
//! Archive paths are taken relative to the directory being packed and always
//! use `/` separators, so the archive root holds the directory's contents
//! rather than the directory itself. Entries are written in sorted path order
//! and directories are not recorded.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use thiserror::Error;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

/// Errors arising while writing an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Reading a source file or writing the archive file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The zip encoder rejected an entry or failed to finalise.
    #[error("zip error: {0}")]
    Zip(#[from] ZipError),

    /// Walking the source directory failed.
    #[error("failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A source path is not valid UTF-8 or lies outside the source directory.
    #[error("unsupported path in source directory: {0}")]
    InvalidPath(String),
}

/// Collect `(source_path, archive_name)` pairs for every regular file under
/// `src_dir`, sorted by archive name.
///
/// # Errors
///
/// Returns [`ArchiveError::Walk`] if the directory cannot be traversed or
/// [`ArchiveError::InvalidPath`] for non-UTF-8 paths.
pub fn collect_entries(src_dir: &Utf8Path) -> Result<Vec<(Utf8PathBuf, String)>, ArchiveError> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(src_dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = Utf8PathBuf::try_from(entry.into_path())
            .map_err(|e| ArchiveError::InvalidPath(e.to_string()))?;
        let relative = path
            .strip_prefix(src_dir)
            .map_err(|_| ArchiveError::InvalidPath(path.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join("/");

        entries.push((path, name));
    }

    entries.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(entries)
}

/// Pack every regular file under `src_dir` into a deflate-compressed zip at
/// `output_path`, returning the archive entry names in write order.
///
/// # Errors
///
/// Returns an [`ArchiveError`] if the source cannot be read or the archive
/// cannot be written. A partially written archive is left for the caller to
/// remove.
pub fn write_zip(src_dir: &Utf8Path, output_path: &Utf8Path) -> Result<Vec<String>, ArchiveError> {
    let entries = collect_entries(src_dir)?;

    let output_file = fs::File::create(output_path)?;
    let mut zip = ZipWriter::new(output_file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (source_path, archive_name) in &entries {
        zip.start_file(archive_name.as_str(), options)?;
        let mut source = fs::File::open(source_path)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    Ok(entries.into_iter().map(|(_, name)| name).collect())
}
