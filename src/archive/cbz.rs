use crate::archive::writer::CbzWriter;
use crate::archive::{ArchiveHandle, pack_into};
use crate::collector::Collector;
use crate::converter::convert_image_to_jpeg;
use crate::error::{Error, Result};
use crate::path_utils::{get_file_name_lossy, is_jpeg_path, path_to_string_lossy};
use crate::types::FixOutcome;
use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tokio::fs;
use tokio::task::spawn_blocking;
use zip::ZipArchive;

/// A zip-format archive on disk (`.cbz` or `.zip`).
///
/// The first-page fix extracts the archive into a scratch directory that is
/// removed when the fix returns, converts the first page there, packs the
/// scratch directory into a staging file in the same directory and persists
/// that over the original, so no other file next to the archive is touched.
#[derive(Debug)]
pub struct CbzArchive {
    path: PathBuf,
}

impl CbzArchive {
    fn extract_blocking(archive_path: &Path, target: &Path) -> Result<()> {
        let mut archive = ZipArchive::new(File::open(archive_path)?)?;
        archive.extract(target)?;
        Ok(())
    }

    /// Rebuilds the archive from `scratch` and swaps it in place.
    ///
    /// The staging file is removed on drop if packing or the swap fails.
    async fn replace_from(&self, scratch: &Path) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staging = NamedTempFile::new_in(parent)?;
        let permissions = fs::metadata(&self.path).await?.permissions();
        staging.as_file().set_permissions(permissions)?;

        let writer = CbzWriter::from_file(staging.reopen()?, &self.path);
        pack_into(scratch, writer).await?;

        staging.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl ArchiveHandle for CbzArchive {
    fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound(format!(
                "Archive does not exist: {}",
                path_to_string_lossy(path)
            )));
        }
        Ok(CbzArchive {
            path: path.to_path_buf(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn entry_names(&self) -> Result<Vec<String>> {
        let archive_path = self.path.clone();
        spawn_blocking(move || -> Result<Vec<String>> {
            let archive = ZipArchive::new(File::open(&archive_path)?)?;
            let mut names: Vec<String> = archive
                .file_names()
                .filter(|name| !name.ends_with('/'))
                .map(str::to_string)
                .collect();
            names.sort();
            Ok(names)
        })
        .await?
    }

    async fn ensure_jpeg_first_page(&mut self, jpeg_quality: u8) -> Result<FixOutcome> {
        let scratch = TempDir::new()?;

        let archive_path = self.path.clone();
        let target = scratch.path().to_path_buf();
        spawn_blocking(move || Self::extract_blocking(&archive_path, &target))
            .await??;

        let pages = Collector::collect_pages(scratch.path()).await?;
        let Some(first_page) = pages.first() else {
            return Ok(FixOutcome::Empty);
        };

        let first_name = get_file_name_lossy(first_page);
        if is_jpeg_path(first_page) {
            return Ok(FixOutcome::AlreadyJpeg(first_name));
        }

        let converted = convert_image_to_jpeg(first_page, jpeg_quality)
            .await
            .map_err(|e| {
                Error::InvalidPath(
                    self.path.clone(),
                    format!("Failed to convert first page '{}': {}", first_name, e),
                )
            })?;

        self.replace_from(scratch.path()).await?;

        let outcome = FixOutcome::Fixed {
            from: first_name,
            to: get_file_name_lossy(&converted),
        };
        log::debug!(
            "Rebuilt '{}' with a JPEG first page ({:?})",
            path_to_string_lossy(self.path()),
            outcome
        );
        Ok(outcome)
    }
}
