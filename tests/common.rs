//! Common test utilities for the Seiri crate.
//!
//! Provides functions for setting up unique test roots, creating page images
//! and archives, and inspecting the archives the pipeline produces.

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use rand::{Rng, distributions::Alphanumeric};
use seiri::error::{Error, Result};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Creates a clean, uniquely named root directory for one test.
#[allow(dead_code)]
pub async fn setup_test_root(sub_path: &str) -> PathBuf {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let root = PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string));
    if root.exists() {
        fs::remove_dir_all(&root).await.unwrap();
    }
    fs::create_dir_all(&root).await.unwrap();
    root
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

async fn save_image<F>(path: &Path, save: F) -> Result<()>
where
    F: FnOnce(&Path) -> image::ImageResult<()> + Send + 'static,
{
    ensure_parent(path).await?;
    let path_clone = path.to_path_buf();
    tokio::task::spawn_blocking(move || save(&path_clone))
        .await?
        .map_err(Error::Image)?;
    Ok(())
}

/// Creates an opaque PNG page filled with `color`.
#[allow(dead_code)]
pub async fn create_png(path: &Path, color: Rgb<u8>) -> Result<()> {
    let img = RgbImage::from_pixel(32, 32, color);
    save_image(path, move |p| img.save_with_format(p, image::ImageFormat::Png)).await
}

/// Creates a fully transparent PNG page.
#[allow(dead_code)]
pub async fn create_transparent_png(path: &Path) -> Result<()> {
    let img = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 0]));
    save_image(path, move |p| img.save_with_format(p, image::ImageFormat::Png)).await
}

/// Creates a JPEG page filled with `color`.
#[allow(dead_code)]
pub async fn create_jpeg(path: &Path, color: Rgb<u8>) -> Result<()> {
    let img = RgbImage::from_pixel(32, 32, color);
    save_image(path, move |p| img.save_with_format(p, image::ImageFormat::Jpeg)).await
}

/// Encodes an opaque PNG in memory.
#[allow(dead_code)]
pub fn png_bytes(color: Rgb<u8>) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbImage::from_pixel(32, 32, color)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Writes a zip archive with the given entries, in the given order.
#[allow(dead_code)]
pub async fn create_zip(path: &Path, entries: &[(&str, Vec<u8>)]) -> Result<()> {
    ensure_parent(path).await?;
    let file = std::fs::File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    for (name, data) in entries {
        writer.start_file(*name, zip::write::SimpleFileOptions::default())?;
        writer.write_all(data)?;
    }
    writer.finish()?;
    Ok(())
}

/// Sorted file entry names of a zip archive.
#[allow(dead_code)]
pub fn zip_entry_names(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// Reads one entry of a zip archive.
#[allow(dead_code)]
pub fn zip_entry_bytes(path: &Path, name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut data = Vec::new();
    entry.read_to_end(&mut data).unwrap();
    data
}

/// Relative path -> file bytes for everything below `root`.
#[allow(dead_code)]
pub fn snapshot_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| entry.unwrap())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .to_string();
            let data = if entry.file_type().is_file() {
                std::fs::read(entry.path()).unwrap()
            } else {
                Vec::new()
            };
            (relative, data)
        })
        .collect()
}
