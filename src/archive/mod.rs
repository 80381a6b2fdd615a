//! Archive module provides the traits and the zip-backed implementations used
//! to pack chapters and to rework existing archives.
//!
//! Archives are handled by content, not by suffix: a `.cbz` is opened and
//! rewritten exactly like a `.zip`, so the pipeline never has to rename a
//! file just to get it through the zip library.

use crate::error::{Error, Result};
use crate::types::FixOutcome;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use walkdir::WalkDir;

pub mod cbz;
pub mod writer;

/// Common interface for writers that pack page files into an archive.
#[async_trait]
pub trait ArchiveWriter {
    /// Creates the archive file at `output_path`.
    ///
    /// # Returns
    /// * `Result<Self>` - A new writer, or [`Error::AlreadyExists`] if `output_path` exists
    fn new(output_path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Adds the file at `page_path` to the archive under `entry_name`.
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if failed
    async fn add_page(&mut self, page_path: &Path, entry_name: &str) -> Result<&mut Self>
    where
        Self: Sized;

    /// Finalizes the archive and flushes it to disk.
    async fn save(self) -> Result<()>;
}

/// An existing zip-format archive, whatever its file suffix.
#[async_trait]
pub trait ArchiveHandle {
    /// Opens the archive at `path` without modifying it.
    fn open(path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Location of the archive on disk.
    fn path(&self) -> &Path;

    /// Names of every file entry in the archive, sorted.
    async fn entry_names(&self) -> Result<Vec<String>>;

    /// Makes sure the first page (smallest top-level file name) is a JPEG,
    /// converting it and rebuilding the archive in place if it is not.
    ///
    /// On error the archive on disk is left exactly as it was.
    async fn ensure_jpeg_first_page(&mut self, jpeg_quality: u8) -> Result<FixOutcome>;
}

/// Relative entry names of every regular file below `source_dir`, sorted.
///
/// Names use `/` as separator; a flat folder yields bare file names.
pub fn list_entry_names(source_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(source_dir).min_depth(1).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(source_dir).map_err(|e| {
            Error::InvalidPath(entry.path().to_path_buf(), e.to_string())
        })?;
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");
        entries.push((name, entry.into_path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Packs every file below `source_dir` into a new archive at `output_path`.
///
/// A partially written archive is removed if packing fails after the file
/// was created.
///
/// # Returns
/// * `Result<usize>` - Number of entries written
pub async fn pack_directory<W>(source_dir: &Path, output_path: &Path) -> Result<usize>
where
    W: ArchiveWriter + Send,
{
    let writer = W::new(output_path)?;
    match pack_into(source_dir, writer).await {
        Ok(count) => Ok(count),
        Err(e) => {
            let _ = tokio::fs::remove_file(output_path).await;
            Err(e)
        }
    }
}

/// Packs every file below `source_dir` through an already created `writer`.
///
/// Cleaning up the output on failure is left to the caller.
pub async fn pack_into<W>(source_dir: &Path, mut writer: W) -> Result<usize>
where
    W: ArchiveWriter + Send,
{
    let source = source_dir.to_path_buf();
    let entries = spawn_blocking(move || list_entry_names(&source)).await??;

    for (name, path) in &entries {
        writer.add_page(path, name).await?;
    }
    writer.save().await?;
    Ok(entries.len())
}
