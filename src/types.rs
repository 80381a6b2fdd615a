//! Core data types and reports for the Seiri pipeline.
//!
//! This module defines:
//! - Step identification (`StepKind`) and outcomes (`StepOutcome`, `StepReport`)
//! - The aggregated run report (`RunReport`)
//! - Results of archive and chapter operations (`FixOutcome`, `ChapterOutcome`)

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// The individual transformations the pipeline performs.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepKind {
    /// Converting a loose page image to JPEG before packing.
    ConvertFirstPage,
    /// Packing a chapter folder into `<chapter>.cbz`.
    ArchiveChapter,
    /// Deleting a chapter folder after it was packed.
    RemoveChapterFolder,
    /// Re-packing an archive so its first page is a JPEG.
    FixFirstArchive,
    /// Renaming a `.zip` archive to `.cbz`.
    NormalizeExtension,
    /// Moving a loose root archive into its own manga folder.
    PromoteRootArchive,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepKind::ConvertFirstPage => "convert first page",
            StepKind::ArchiveChapter => "archive chapter",
            StepKind::RemoveChapterFolder => "remove chapter folder",
            StepKind::FixFirstArchive => "fix first archive",
            StepKind::NormalizeExtension => "normalize extension",
            StepKind::PromoteRootArchive => "promote root archive",
        };
        f.write_str(label)
    }
}

/// What happened to a single step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepOutcome {
    Completed,
    /// Nothing to do; carries the reason.
    Skipped(String),
    /// The step failed and left its subject as it was; carries the error text.
    Failed(String),
}

/// Outcome of one step applied to one path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepReport {
    pub kind: StepKind,
    pub path: PathBuf,
    pub outcome: StepOutcome,
}

impl StepReport {
    pub fn completed(kind: StepKind, path: &Path) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            outcome: StepOutcome::Completed,
        }
    }

    pub fn skipped(kind: StepKind, path: &Path, reason: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            outcome: StepOutcome::Skipped(reason.into()),
        }
    }

    pub fn failed(kind: StepKind, path: &Path, error: &Error) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            outcome: StepOutcome::Failed(error.trace()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, StepOutcome::Failed(_))
    }
}

/// Report of a full pipeline run, in execution order.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    pub root_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: StepReport) {
        self.steps.push(step);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Steps that failed, in execution order.
    pub fn failures(&self) -> Vec<&StepReport> {
        self.steps.iter().filter(|step| step.is_failure()).collect()
    }

    /// Number of steps of `kind` that completed.
    pub fn completed_count(&self, kind: StepKind) -> usize {
        self.steps
            .iter()
            .filter(|step| step.kind == kind && step.outcome == StepOutcome::Completed)
            .count()
    }

    /// True if the run changed nothing on disk.
    pub fn is_noop(&self) -> bool {
        self.steps
            .iter()
            .all(|step| step.outcome != StepOutcome::Completed)
    }

    pub fn is_clean(&self) -> bool {
        self.failures().is_empty()
    }
}

/// Result of normalizing the first page of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FixOutcome {
    /// The first page was converted and the archive rebuilt.
    Fixed { from: String, to: String },
    /// The first page is already a JPEG; the archive was not touched.
    AlreadyJpeg(String),
    /// The archive holds no regular file at its top level.
    Empty,
}

impl FixOutcome {
    pub fn is_fixed(&self) -> bool {
        matches!(self, FixOutcome::Fixed { .. })
    }
}

/// Result of processing one chapter folder.
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterOutcome {
    /// The folder had no regular files and was left alone.
    Empty,
    /// The folder was packed into the given archive.
    Archived(PathBuf),
}
