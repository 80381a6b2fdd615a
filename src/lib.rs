//! Seiri - Manga Chapter to CBZ Normalizer
//!
//! This crate turns a directory tree of downloaded manga chapters into CBZ
//! archives and makes sure the very first page a reader or thumbnailer sees
//! is a JPEG.
//!
//! # Getting Started
//!
//! The expected layout is `root/<manga>/<chapter>/<page image>`, optionally
//! with loose `.zip`/`.cbz` files directly in `root`. Configure the run with
//! [`SeiriConfig::builder`] and execute it with [`SeiriConfig::normalize`]:
//!
//! ```rust,no_run
//! use seiri::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> seiri::error::Result<()> {
//!     let config = SeiriConfig::builder()
//!         .root_path(PathBuf::from("./Processing"))
//!         .build()?;
//!
//!     let report = config.normalize().await?;
//!     println!(
//!         "Archived {} chapters with {} failures",
//!         report.completed_count(StepKind::ArchiveChapter),
//!         report.failures().len()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! Running the pipeline again over an already normalized tree changes nothing.

pub mod archive;
pub mod collector;
pub mod converter;
pub mod error;
pub mod path_utils;
pub mod seiri;
pub mod types;

pub use seiri::SeiriConfig;
pub use seiri::SeiriConfigBuilder;

pub use types::{ChapterOutcome, FixOutcome, RunReport, StepKind, StepOutcome, StepReport};

/// Prelude module for convenient imports.
///
/// Re-exports the most commonly used types and traits so that a single
/// `use seiri::prelude::*;` is enough for typical usage.
pub mod prelude {
    pub use super::{
        ChapterOutcome, FixOutcome, RunReport, SeiriConfig, SeiriConfigBuilder, StepKind,
        StepOutcome, StepReport, error,
    };
    pub use crate::archive::cbz::CbzArchive;
    pub use crate::archive::writer::CbzWriter;
    pub use crate::archive::{ArchiveHandle, ArchiveWriter};
    pub use crate::collector::Collector;
    pub use std::path::{Path, PathBuf};
}
