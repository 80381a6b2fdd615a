use crate::archive::ArchiveWriter;
use crate::error::{Error, Result};
use crate::path_utils::path_to_string_lossy;
use async_trait::async_trait;
use memmap2::MmapOptions;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::spawn_blocking;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A writer for CBZ (Comic Book ZIP) files.
///
/// Pages are stored under the entry name the caller chooses, in the order
/// they are added, deflate compressed.
pub struct CbzWriter {
    zip: Option<ZipWriter<File>>,
    options: SimpleFileOptions,
    output_path: PathBuf,
    page_count: usize,
}

impl CbzWriter {
    /// Wraps a file that is already open for writing, e.g. a staging file.
    ///
    /// `output_path` is only used for logging.
    pub fn from_file(file: File, output_path: &Path) -> Self {
        let options: SimpleFileOptions = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        CbzWriter {
            zip: Some(ZipWriter::new(file)),
            options,
            output_path: output_path.to_path_buf(),
            page_count: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

#[async_trait]
impl ArchiveWriter for CbzWriter {
    fn new(output_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(output_path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => Error::AlreadyExists(output_path.to_path_buf()),
                _ => Error::Io(e),
            })?;

        Ok(Self::from_file(file, output_path))
    }

    async fn add_page(&mut self, page_path: &Path, entry_name: &str) -> Result<&mut Self> {
        let file = fs::File::open(page_path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to open page file '{}': {}",
                    path_to_string_lossy(page_path),
                    e
                ),
            ))
        })?;
        let is_empty = file.metadata().await?.len() == 0;
        let file_std = file.into_std().await;
        let options = self.options;

        let zip = match self.zip.as_mut() {
            Some(z) => z,
            None => {
                return Err(Error::Unsupported("Zip writer not available".to_string()));
            }
        };

        zip.start_file(entry_name, options)?;

        // Zero-length files cannot be mapped
        if !is_empty {
            let mmap = spawn_blocking(move || unsafe { MmapOptions::new().map(&file_std) })
                .await??;
            zip.write_all(&mmap[..])?;
        }

        self.page_count += 1;

        Ok(self)
    }

    async fn save(mut self) -> Result<()> {
        let zip = match self.zip.take() {
            Some(z) => z,
            None => {
                return Err(Error::Unsupported("Zip writer not available".to_string()));
            }
        };

        let output_path = self.output_path.clone();
        let page_count = self.page_count;
        spawn_blocking(move || match zip.finish() {
            Ok(file) => file.sync_all().map_err(Error::Io),
            Err(e) => Err(Error::Zip(e)),
        })
        .await??;

        log::debug!(
            "Wrote {} entries to '{}'",
            page_count,
            path_to_string_lossy(&output_path)
        );
        Ok(())
    }
}
