//! Custom error types and result handling for Seiri operations.
//!
//! Every fallible operation returns a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`. The pipeline itself never aborts on these
//! errors past the preflight check: each step turns them into a
//! [`StepOutcome::Failed`](crate::types::StepOutcome::Failed) entry of the run report.
//!
use std::error::Error as StdError;
use std::path::PathBuf;

/// Type alias for Results with Seiri errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all Seiri operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Image decoding or encoding errors
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Errors raised while walking a directory tree
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
    /// A blocking task panicked or was cancelled
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    SeiriBuilder(#[from] crate::seiri::SeiriConfigBuilderError),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// A rename or move would overwrite an existing file
    #[error("Refusing to overwrite existing path '{0:?}'")]
    AlreadyExists(PathBuf),
    /// Error for unsupported operations or formats
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Error for resources that couldn't be found (e.g., the root directory)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Renders the error together with its chain of sources, one per line.
    pub fn trace(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = StdError::source(self);
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            if !rendered.ends_with(&cause_text) {
                rendered.push_str("\n  caused by: ");
                rendered.push_str(&cause_text);
            }
            source = StdError::source(cause);
        }
        rendered
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
