//! Unit tests for core Seiri functionality.
//!
//! Tests configuration, collection and reporting in isolation without
//! running the full pipeline.

use image::Rgb;
use seiri::error::{Error, Result};
use seiri::prelude::*;

mod common;
use common::{create_png, create_zip, png_bytes, setup_test_root};

#[tokio::test]
async fn test_seiri_config_builder_validation() -> Result<()> {
    let missing_root = SeiriConfig::builder().build();
    assert!(missing_root.is_err());
    assert!(missing_root.unwrap_err().to_string().contains("root_path"));

    let bad_quality = SeiriConfig::builder()
        .root_path(PathBuf::from("/tmp"))
        .jpeg_quality(0)
        .build();
    assert!(
        bad_quality
            .unwrap_err()
            .to_string()
            .contains("JPEG quality must be between 1 and 100")
    );

    let empty_root = SeiriConfig::builder().root_path(PathBuf::new()).build();
    assert!(empty_root.is_err());

    let config = SeiriConfig::builder()
        .root_path(PathBuf::from("/tmp"))
        .build()?;
    assert!(config.promote_root_archives);
    assert_eq!(config.jpeg_quality, 75);
    Ok(())
}

#[tokio::test]
async fn test_seiri_config_preflight_check() -> Result<()> {
    let root = setup_test_root("preflight_check").await;

    let config = SeiriConfig::builder().root_path(root.clone()).build()?;
    assert!(config.preflight_check().is_ok());

    let config = SeiriConfig::builder()
        .root_path(root.join("nonexistent"))
        .build()?;
    let result = config.preflight_check();
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Root path does not exist")
    );

    let file_root = root.join("file.txt");
    tokio::fs::write(&file_root, b"x").await?;
    let config = SeiriConfig::builder().root_path(file_root).build()?;
    assert!(matches!(
        config.preflight_check(),
        Err(Error::InvalidPath(_, _))
    ));

    // normalize refuses to run on a missing root
    let config = SeiriConfig::builder()
        .root_path(root.join("nonexistent"))
        .build()?;
    assert!(config.normalize().await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_collector_lists_sorted_entries() -> Result<()> {
    let root = setup_test_root("collector_sorted").await;
    let manga = root.join("Manga");
    create_png(&manga.join("Ch10").join("b.png"), Rgb([1, 2, 3])).await?;
    create_png(&manga.join("Ch10").join("a.png"), Rgb([1, 2, 3])).await?;
    create_png(&manga.join("Ch02").join("x.png"), Rgb([1, 2, 3])).await?;
    tokio::fs::create_dir_all(manga.join("Ch10").join("extras")).await?;
    tokio::fs::write(root.join("Loose.CBZ"), b"").await?;
    tokio::fs::write(root.join("notes.txt"), b"").await?;

    let collector = Collector::new(&root);
    assert_eq!(collector.collect_manga_folders().await?, vec![manga.clone()]);
    assert_eq!(
        collector.collect_root_archives().await?,
        vec![root.join("Loose.CBZ")]
    );
    assert_eq!(
        collector.root_listing().await?,
        vec!["Loose.CBZ", "Manga", "notes.txt"]
    );

    // Lexicographic, not numeric
    assert_eq!(
        Collector::collect_chapters(&manga).await?,
        vec![manga.join("Ch02"), manga.join("Ch10")]
    );
    assert_eq!(
        Collector::collect_pages(&manga.join("Ch10")).await?,
        vec![manga.join("Ch10").join("a.png"), manga.join("Ch10").join("b.png")]
    );
    Ok(())
}

#[tokio::test]
async fn test_collector_walks_archives_recursively() -> Result<()> {
    let root = setup_test_root("collector_archives").await;
    let manga = root.join("Manga");
    create_zip(&manga.join("b.cbz"), &[("1.png", png_bytes(Rgb([0, 0, 0])))]).await?;
    create_zip(&manga.join("a.ZIP"), &[("1.png", png_bytes(Rgb([0, 0, 0])))]).await?;
    create_zip(
        &manga.join("Leftover").join("c.zip"),
        &[("1.png", png_bytes(Rgb([0, 0, 0])))],
    )
    .await?;
    tokio::fs::write(manga.join("cover.png"), b"").await?;

    let archives = Collector::collect_archives(&manga).await?;
    assert_eq!(
        archives,
        vec![
            manga.join("Leftover").join("c.zip"),
            manga.join("a.ZIP"),
            manga.join("b.cbz"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_run_report_helpers() -> Result<()> {
    let mut report = RunReport::new(PathBuf::from("/root"));
    assert!(report.is_noop());
    assert!(report.is_clean());

    report.push(StepReport::skipped(
        StepKind::FixFirstArchive,
        Path::new("/root/M/Ch1.cbz"),
        "first page 'a.jpg' is already a JPEG",
    ));
    assert!(report.is_noop());

    report.push(StepReport::completed(
        StepKind::ArchiveChapter,
        Path::new("/root/M/Ch1.cbz"),
    ));
    let error = Error::AlreadyExists(PathBuf::from("/root/M/Ch2.cbz"));
    report.push(StepReport::failed(
        StepKind::ArchiveChapter,
        Path::new("/root/M/Ch2"),
        &error,
    ));
    report.finish();

    assert!(!report.is_noop());
    assert!(!report.is_clean());
    assert_eq!(report.completed_count(StepKind::ArchiveChapter), 1);
    assert_eq!(report.failures().len(), 1);
    assert!(matches!(
        &report.failures()[0].outcome,
        StepOutcome::Failed(message) if message.contains("Refusing to overwrite")
    ));
    assert!(report.finished_at.is_some_and(|end| end >= report.started_at));
    Ok(())
}

#[tokio::test]
async fn test_process_chapter_folder_directly() -> Result<()> {
    let root = setup_test_root("chapter_directly").await;
    let chapter = root.join("Manga").join("Vol.1 Ch.1");
    create_png(&chapter.join("01.png"), Rgb([9, 9, 9])).await?;

    let config = SeiriConfig::builder().root_path(root.clone()).build()?;
    let mut report = RunReport::new(root.clone());
    let outcome = config
        .process_chapter_folder(&chapter, false, &mut report)
        .await?;

    let expected = root.join("Manga").join("Vol.1 Ch.1.cbz");
    assert_eq!(outcome, ChapterOutcome::Archived(expected.clone()));
    assert!(expected.is_file());
    assert!(!chapter.exists());
    Ok(())
}
