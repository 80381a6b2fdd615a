//! Directory listing for the manga tree.
//!
//! The collector answers the questions the pipeline asks about the tree:
//! which manga folders live under the root, which chapter folders a manga
//! has, which pages a chapter holds, and which archives sit in a manga
//! folder or loose in the root. All listings come back sorted so that
//! "first" always means the smallest name.

use std::path::{Path, PathBuf};

use tokio::fs::{ReadDir, read_dir};
use tokio::task::spawn_blocking;
use walkdir::WalkDir;

use crate::error::Result;
use crate::path_utils::{compare_file_names, compare_full_paths, is_archive_path};

/// Which directory entries a listing keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    Directories,
    Files,
}

/// Collects manga folders, chapters, pages and archives below a root directory.
#[derive(Debug)]
pub struct Collector<'a> {
    root_directory: &'a Path,
}

impl<'a> Collector<'a> {
    /// Creates a new Collector for the given root directory.
    pub fn new(root_directory: &'a Path) -> Self {
        Self { root_directory }
    }

    /// Names of every entry directly under the root, sorted.
    pub async fn root_listing(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries: ReadDir = read_dir(self.root_directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    /// Manga folders directly under the root, sorted by name.
    pub async fn collect_manga_folders(&self) -> Result<Vec<PathBuf>> {
        Self::collect_entries(self.root_directory, EntryFilter::Directories).await
    }

    /// Loose `.zip`/`.cbz` files directly under the root, sorted by name.
    pub async fn collect_root_archives(&self) -> Result<Vec<PathBuf>> {
        let files = Self::collect_entries(self.root_directory, EntryFilter::Files).await?;
        Ok(files
            .into_iter()
            .filter(|path| is_archive_path(path))
            .collect())
    }

    /// Chapter folders directly under a manga folder, sorted by name.
    pub async fn collect_chapters(manga_folder: &Path) -> Result<Vec<PathBuf>> {
        Self::collect_entries(manga_folder, EntryFilter::Directories).await
    }

    /// Regular files directly inside a chapter folder, sorted by name.
    pub async fn collect_pages(chapter_folder: &Path) -> Result<Vec<PathBuf>> {
        Self::collect_entries(chapter_folder, EntryFilter::Files).await
    }

    /// Every `.zip`/`.cbz` file anywhere below `manga_folder`, sorted by full path.
    pub async fn collect_archives(manga_folder: &Path) -> Result<Vec<PathBuf>> {
        let manga_folder = manga_folder.to_path_buf();
        spawn_blocking(move || -> Result<Vec<PathBuf>> {
            let mut archives = Vec::new();
            for entry in WalkDir::new(&manga_folder).min_depth(1) {
                let entry = entry?;
                if entry.file_type().is_file() && is_archive_path(entry.path()) {
                    archives.push(entry.into_path());
                }
            }
            archives.sort_by(|a, b| compare_full_paths(a, b));
            Ok(archives)
        })
        .await?
    }

    /// Lists the direct children of `directory` that match `filter`, sorted by
    /// file name. Symlinks are followed when deciding file or directory;
    /// anything that is neither (dangling links, sockets) is dropped.
    pub async fn collect_entries(directory: &Path, filter: EntryFilter) -> Result<Vec<PathBuf>> {
        let mut entries: Vec<PathBuf> = Vec::new();
        let mut paths: ReadDir = read_dir(directory).await?;

        while let Some(entry) = paths.next_entry().await? {
            let path = entry.path();
            let Ok(metadata) = tokio::fs::metadata(&path).await else {
                continue;
            };

            let keep = match filter {
                EntryFilter::Directories => metadata.is_dir(),
                EntryFilter::Files => metadata.is_file(),
            };
            if keep {
                entries.push(path);
            }
        }

        entries.sort_by(|a, b| compare_file_names(a, b));
        Ok(entries)
    }
}
