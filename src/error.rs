//! Error types for executable image loading.
//!
//! Only failures that prevent an image from being populated are errors.
//! Malformed header tables are reported through
//! [`DiagnosticSink`](crate::logging::DiagnosticSink) and leave the image usable.

use std::path::PathBuf;
use thiserror::Error;

/// Terminal failure of a load operation.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The path or disc entry does not exist, or its size is the -1 sentinel.
    #[error("ELF file does not exist: {path}")]
    NotFound { path: String },

    /// Declared size exceeds the loader limit.
    #[error("Illegal ELF file size {size:#x} (limit {limit:#x})")]
    TooLarge { size: i64, limit: u64 },

    /// Declared size cannot hold an ELF header.
    #[error("Unexpected end of ELF file: {size} bytes, need more than {minimum}")]
    Truncated { size: i64, minimum: usize },

    /// The byte source failed to open, stat or read.
    #[error("Failed to read ELF from '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for load operations
pub type Result<T> = std::result::Result<T, LoadError>;
