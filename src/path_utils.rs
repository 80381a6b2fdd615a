//! Path utilities for name matching and sibling path derivation.
//!
//! All suffix checks are case-insensitive and operate on the file name only,
//! so `Chapter.CBZ` counts as an archive and `Cover.JPEG` as a JPEG page.

use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Extension given to every normalized archive.
pub const CBZ_EXTENSION: &str = "cbz";
/// Extension given to converted pages.
pub const JPEG_EXTENSION: &str = "jpg";

lazy_static! {
    /// Matches file names of archives the pipeline handles (`.zip` or `.cbz`).
    pub static ref ARCHIVE_NAME_REGEX: Regex = Regex::new(r"(?i)\.(zip|cbz)$").unwrap();
    /// Matches file names of pages that are already JPEG (`.jpg` or `.jpeg`).
    pub static ref JPEG_NAME_REGEX: Regex = Regex::new(r"(?i)\.jpe?g$").unwrap();
    /// Matches plain `.zip` archive names that still need the `.cbz` suffix.
    pub static ref ZIP_NAME_REGEX: Regex = Regex::new(r"(?i)\.zip$").unwrap();
}

/// Gets the file name from a path with fallback to lossy conversion.
pub fn get_file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Gets the file stem (name without its last extension) with lossy conversion.
pub fn get_file_stem_lossy(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// True if the file name ends in `.zip` or `.cbz`.
pub fn is_archive_path(path: &Path) -> bool {
    ARCHIVE_NAME_REGEX.is_match(&get_file_name_lossy(path))
}

/// True if the file name ends in `.zip`.
pub fn is_zip_path(path: &Path) -> bool {
    ZIP_NAME_REGEX.is_match(&get_file_name_lossy(path))
}

/// True if the file name ends in `.jpg` or `.jpeg`.
pub fn is_jpeg_path(path: &Path) -> bool {
    JPEG_NAME_REGEX.is_match(&get_file_name_lossy(path))
}

/// Sibling path with the `.jpg` extension, e.g. `001.png` -> `001.jpg`.
pub fn jpeg_sibling(path: &Path) -> PathBuf {
    path.with_extension(JPEG_EXTENSION)
}

/// Sibling path with the `.cbz` extension, e.g. `Vol 1.zip` -> `Vol 1.cbz`.
pub fn cbz_sibling(path: &Path) -> PathBuf {
    path.with_extension(CBZ_EXTENSION)
}

/// Path of the archive `<name>.cbz` next to a chapter folder `<name>`.
///
/// The extension is appended rather than substituted so that folder names
/// containing dots (`Vol.1 Ch.2`) keep their full name.
pub fn archive_path_for_folder(folder: &Path) -> PathBuf {
    let mut file_name = folder
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    file_name.push(".");
    file_name.push(CBZ_EXTENSION);
    folder.with_file_name(file_name)
}

/// Orders two paths by their file name only.
pub fn compare_file_names(a: &Path, b: &Path) -> Ordering {
    a.file_name().cmp(&b.file_name())
}

/// Orders two paths by their full textual form, the way a sorted list of
/// path strings would be ordered.
pub fn compare_full_paths(a: &Path, b: &Path) -> Ordering {
    a.as_os_str().cmp(b.as_os_str())
}
