use std::path::{Path, PathBuf};

use tokio::fs;

use crate::archive::cbz::CbzArchive;
use crate::archive::writer::CbzWriter;
use crate::archive::{ArchiveHandle, pack_directory};
use crate::collector::Collector;
use crate::converter::{DEFAULT_JPEG_QUALITY, convert_image_to_jpeg};
use crate::error::{Error, Result};
use crate::path_utils::{
    archive_path_for_folder, cbz_sibling, get_file_name_lossy, get_file_stem_lossy,
    is_jpeg_path, is_zip_path, path_to_string_lossy,
};
use crate::types::{ChapterOutcome, FixOutcome, RunReport, StepKind, StepReport};

/// File name given to a loose root archive once it is moved into its own folder.
pub const PROMOTED_CHAPTER_NAME: &str = "Chapter 1.cbz";

/// The Seiri normalization configuration, built declaratively using the builder pattern.
///
/// A configured value drives the whole pipeline over [`root_path`](SeiriConfig::root_path):
///
/// 1. Every chapter folder of every manga folder is packed into `<chapter>.cbz`,
///    converting the first page of the first chapter to JPEG beforehand.
/// 2. The first archive (by full path) of each manga folder gets its first page
///    converted to JPEG if it is not one already.
/// 3. Remaining `.zip` archives of the manga folder are renamed to `.cbz`.
/// 4. If [`promote_root_archives`](SeiriConfig::promote_root_archives) is set, loose
///    archives in the root are normalized the same way and moved to
///    `<root>/<archive name>/Chapter 1.cbz`.
///
/// Steps never abort the run: each one is recorded in the returned [`RunReport`].
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use seiri::prelude::*;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> seiri::error::Result<()> {
/// let config = SeiriConfig::builder()
///     .root_path(PathBuf::from("/data/manga/incoming"))
///     .promote_root_archives(true)
///     .build()?;
///
/// let report = config.normalize().await?;
/// for failure in report.failures() {
///     eprintln!("{} failed for {:?}", failure.kind, failure.path);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SeiriConfig {
    /// Directory holding the manga folders (and optionally loose archives).
    ///
    /// Expected layout: `root/<manga>/<chapter>/<page image>`.
    pub root_path: PathBuf,

    /// Whether loose `.zip`/`.cbz` files directly in the root are moved into a
    /// folder of their own as `Chapter 1.cbz`.
    #[builder(default = "true")]
    pub promote_root_archives: bool,

    /// Quality (1-100) of the JPEG written when a first page is converted.
    #[builder(default = "DEFAULT_JPEG_QUALITY")]
    pub jpeg_quality: u8,
}

impl SeiriConfig {
    /// Creates a new builder for configuring `SeiriConfig`.
    pub fn builder() -> SeiriConfigBuilder {
        SeiriConfigBuilder::default()
    }

    /// Checks that the root directory exists and is a directory.
    ///
    /// [`normalize`](SeiriConfig::normalize) calls this before touching anything.
    pub fn preflight_check(&self) -> Result<&Self> {
        if self.root_path.as_os_str().is_empty() {
            return Err(Error::Other("Root path is required".to_string()));
        }
        if !self.root_path.exists() {
            return Err(Error::NotFound(format!(
                "Root path does not exist: {:?}",
                self.root_path
            )));
        }
        if !self.root_path.is_dir() {
            return Err(Error::InvalidPath(
                self.root_path.clone(),
                "Root path is not a directory.".to_string(),
            ));
        }
        Ok(self)
    }

    /// Runs the full pipeline over the root directory.
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - Every step that ran, including the ones that failed
    /// * `Err(Error)` - The configuration is invalid or the root cannot be listed
    pub async fn normalize(&self) -> Result<RunReport> {
        self.preflight_check()?;

        let collector = Collector::new(&self.root_path);
        let mut report = RunReport::new(self.root_path.clone());

        log::info!("Scanning: {}", path_to_string_lossy(&self.root_path));
        log::info!("Contents: {:?}", collector.root_listing().await?);

        for manga_folder in collector.collect_manga_folders().await? {
            self.process_manga_folder(&manga_folder, &mut report).await;
        }

        if self.promote_root_archives {
            for archive in collector.collect_root_archives().await? {
                self.promote_root_archive(&archive, &mut report).await;
            }
        }

        report.finish();
        log::info!(
            "Done: {} chapters archived, {} archives fixed, {} renamed, {} promoted, {} failures",
            report.completed_count(StepKind::ArchiveChapter),
            report.completed_count(StepKind::FixFirstArchive),
            report.completed_count(StepKind::NormalizeExtension),
            report.completed_count(StepKind::PromoteRootArchive),
            report.failures().len()
        );
        Ok(report)
    }

    /// Archives the chapters of one manga folder, fixes its first archive and
    /// renames its `.zip` archives to `.cbz`.
    pub async fn process_manga_folder(&self, manga_folder: &Path, report: &mut RunReport) {
        log::info!("Processing manga folder: {}", path_to_string_lossy(manga_folder));

        match Collector::collect_chapters(manga_folder).await {
            Ok(chapters) => {
                for (index, chapter) in chapters.iter().enumerate() {
                    let is_first_chapter = index == 0;
                    if let Err(e) = self
                        .process_chapter_folder(chapter, is_first_chapter, report)
                        .await
                    {
                        match &e {
                            Error::AlreadyExists(existing) => warn_left_in_place(chapter, existing),
                            _ => log::error!(
                                "Error archiving chapter {}: {}",
                                path_to_string_lossy(chapter),
                                e.trace()
                            ),
                        }
                        report.push(StepReport::failed(StepKind::ArchiveChapter, chapter, &e));
                    }
                }
            }
            Err(e) => {
                log::error!(
                    "Error listing chapters of {}: {}",
                    path_to_string_lossy(manga_folder),
                    e
                );
                report.push(StepReport::failed(
                    StepKind::ArchiveChapter,
                    manga_folder,
                    &e,
                ));
            }
        }

        let archives = match Collector::collect_archives(manga_folder).await {
            Ok(archives) => archives,
            Err(e) => {
                log::error!(
                    "Error collecting archives of {}: {}",
                    path_to_string_lossy(manga_folder),
                    e
                );
                report.push(StepReport::failed(
                    StepKind::FixFirstArchive,
                    manga_folder,
                    &e,
                ));
                return;
            }
        };

        if let Some(first_archive) = archives.first() {
            self.fix_archive(first_archive, report).await;
        }

        for archive in archives.iter().filter(|archive| is_zip_path(archive)) {
            self.normalize_extension(archive, report).await;
        }
    }

    /// Packs one chapter folder into `<chapter>.cbz` next to it and removes the folder.
    ///
    /// If `is_first_chapter` is set and the first page is not a JPEG it is
    /// converted before packing; a failed conversion is recorded and packing
    /// goes ahead with the original page. A failed folder removal is recorded
    /// too and does not make the chapter fail.
    ///
    /// # Returns
    ///
    /// * `Ok(ChapterOutcome)` - Whether the folder was archived or had no files
    /// * `Err(Error)` - The folder could not be listed or packed; it is left in place
    pub async fn process_chapter_folder(
        &self,
        chapter_folder: &Path,
        is_first_chapter: bool,
        report: &mut RunReport,
    ) -> Result<ChapterOutcome> {
        let pages = Collector::collect_pages(chapter_folder).await?;
        let Some(first_page) = pages.first() else {
            log::warn!(
                "Skipping empty chapter folder: {}",
                path_to_string_lossy(chapter_folder)
            );
            report.push(StepReport::skipped(
                StepKind::ArchiveChapter,
                chapter_folder,
                "no files",
            ));
            return Ok(ChapterOutcome::Empty);
        };

        if is_first_chapter && !is_jpeg_path(first_page) {
            match convert_image_to_jpeg(first_page, self.jpeg_quality).await {
                Ok(_) => {
                    log::info!(
                        "Converted first image in first chapter folder: {}",
                        path_to_string_lossy(chapter_folder)
                    );
                    report.push(StepReport::completed(StepKind::ConvertFirstPage, first_page));
                }
                Err(e) => {
                    log::error!(
                        "Error converting {}: {}",
                        path_to_string_lossy(first_page),
                        e
                    );
                    report.push(StepReport::failed(StepKind::ConvertFirstPage, first_page, &e));
                }
            }
        }

        let archive_path = archive_path_for_folder(chapter_folder);
        let entries = pack_directory::<CbzWriter>(chapter_folder, &archive_path).await?;
        log::info!(
            "Archived {} ({} files)",
            path_to_string_lossy(&archive_path),
            entries
        );
        report.push(StepReport::completed(StepKind::ArchiveChapter, &archive_path));

        match fs::remove_dir_all(chapter_folder).await {
            Ok(()) => report.push(StepReport::completed(
                StepKind::RemoveChapterFolder,
                chapter_folder,
            )),
            Err(e) => {
                let e = Error::from(e);
                log::error!(
                    "Error removing folder {}: {}",
                    path_to_string_lossy(chapter_folder),
                    e
                );
                report.push(StepReport::failed(
                    StepKind::RemoveChapterFolder,
                    chapter_folder,
                    &e,
                ));
            }
        }

        Ok(ChapterOutcome::Archived(archive_path))
    }

    /// Makes sure the first page of `archive` is a JPEG, recording the outcome.
    pub async fn fix_archive(
        &self,
        archive: &Path,
        report: &mut RunReport,
    ) -> Option<FixOutcome> {
        let result = match CbzArchive::open(archive) {
            Ok(mut handle) => handle.ensure_jpeg_first_page(self.jpeg_quality).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                let step = match &outcome {
                    FixOutcome::Fixed { from, to } => {
                        log::info!(
                            "Fixed first image in {}: {} -> {}",
                            path_to_string_lossy(archive),
                            from,
                            to
                        );
                        StepReport::completed(StepKind::FixFirstArchive, archive)
                    }
                    FixOutcome::AlreadyJpeg(name) => StepReport::skipped(
                        StepKind::FixFirstArchive,
                        archive,
                        format!("first page '{}' is already a JPEG", name),
                    ),
                    FixOutcome::Empty => {
                        log::warn!("Archive has no files: {}", path_to_string_lossy(archive));
                        StepReport::skipped(StepKind::FixFirstArchive, archive, "no files")
                    }
                };
                report.push(step);
                Some(outcome)
            }
            Err(e) => {
                log::error!(
                    "Error processing {}: {}",
                    path_to_string_lossy(archive),
                    e.trace()
                );
                report.push(StepReport::failed(StepKind::FixFirstArchive, archive, &e));
                None
            }
        }
    }

    /// Renames a `.zip` archive to `.cbz`, never overwriting an existing file.
    ///
    /// # Returns
    ///
    /// * `Some(PathBuf)` - The new `.cbz` path
    /// * `None` - The rename failed and was recorded; the archive kept its name
    pub async fn normalize_extension(
        &self,
        archive: &Path,
        report: &mut RunReport,
    ) -> Option<PathBuf> {
        let cbz_path = cbz_sibling(archive);
        match rename_no_clobber(archive, &cbz_path).await {
            Ok(()) => {
                log::info!(
                    "Renamed: {} -> {}",
                    path_to_string_lossy(archive),
                    path_to_string_lossy(&cbz_path)
                );
                report.push(StepReport::completed(StepKind::NormalizeExtension, &cbz_path));
                Some(cbz_path)
            }
            Err(e) => {
                match &e {
                    Error::AlreadyExists(existing) => warn_left_in_place(archive, existing),
                    _ => log::error!("Error renaming {}: {}", path_to_string_lossy(archive), e),
                }
                report.push(StepReport::failed(StepKind::NormalizeExtension, archive, &e));
                None
            }
        }
    }

    /// Normalizes a loose root archive and moves it to `<root>/<stem>/Chapter 1.cbz`.
    ///
    /// The first-page fix runs first and its failure does not stop the move.
    ///
    /// # Returns
    ///
    /// * `Some(PathBuf)` - Final location of the archive
    /// * `None` - The rename or move failed and was recorded
    pub async fn promote_root_archive(
        &self,
        archive: &Path,
        report: &mut RunReport,
    ) -> Option<PathBuf> {
        let file_name = get_file_name_lossy(archive);
        self.fix_archive(archive, report).await;

        let cbz_path = if is_zip_path(archive) {
            self.normalize_extension(archive, report).await?
        } else {
            archive.to_path_buf()
        };

        let folder = self.root_path.join(get_file_stem_lossy(&cbz_path));
        let destination = folder.join(PROMOTED_CHAPTER_NAME);

        let moved: Result<()> = async {
            fs::create_dir_all(&folder).await?;
            rename_no_clobber(&cbz_path, &destination).await
        }
        .await;

        match moved {
            Ok(()) => {
                log::info!(
                    "Moved root archive: {} -> {}",
                    file_name,
                    path_to_string_lossy(&destination)
                );
                report.push(StepReport::completed(
                    StepKind::PromoteRootArchive,
                    &destination,
                ));
                Some(destination)
            }
            Err(e) => {
                match &e {
                    Error::AlreadyExists(existing) => warn_left_in_place(&cbz_path, existing),
                    _ => log::error!("Error moving root archive {}: {}", file_name, e),
                }
                report.push(StepReport::failed(
                    StepKind::PromoteRootArchive,
                    &cbz_path,
                    &e,
                ));
                None
            }
        }
    }
}

/// Renames `from` to `to` unless `to` already exists.
async fn rename_no_clobber(from: &Path, to: &Path) -> Result<()> {
    if fs::try_exists(to).await? {
        return Err(Error::AlreadyExists(to.to_path_buf()));
    }
    fs::rename(from, to).await?;
    Ok(())
}

/// Logs a path the pipeline could not move because its target is taken.
fn warn_left_in_place(leftover: &Path, existing: &Path) {
    log::warn!(
        "Left {} in place because {} already exists; merge or remove one of them by hand",
        path_to_string_lossy(leftover),
        path_to_string_lossy(existing)
    );
}

impl SeiriConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(root_path) = &self.root_path {
            if root_path.as_os_str().is_empty() {
                return Err("Root path must not be empty.".to_string());
            }
        }

        if let Some(quality) = self.jpeg_quality {
            if !(1..=100).contains(&quality) {
                return Err("JPEG quality must be between 1 and 100.".to_string());
            }
        }

        Ok(())
    }
}
