//! ELF32 and PS-X EXE header validation for a console program loader.
//!
//! [`BinaryImage`] owns the bytes of one executable, taken from a host file
//! or a disc image, and exposes its entry point, text range, checksum and
//! header tables. All header access is bounds-checked against the buffer;
//! malformed tables degrade to "absent" instead of failing the load.

pub mod config;
pub mod error;
pub mod formats;
pub mod hashing;
pub mod image;
pub mod io;
pub mod logging;

pub use config::LoaderConfig;
pub use error::{LoadError, Result};
pub use image::{check_elf_size, BinaryImage, LoadOptions, INVALID_ENTRY_POINT};
pub use logging::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
