//! Byte sources the loader reads images from.
//!
//! The loader only needs to locate an entry, learn its length, and read it
//! whole. [`IsoReader`] covers directory entries inside an optical-disc
//! image, [`FileSource`] covers host files.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, trace};

/// Location of a file inside a disc image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Logical sector of the first byte
    pub lba: u32,
    /// Declared length in bytes, as stored in the directory record
    pub length: u32,
}

/// Locates and reads files inside an optical-disc image.
pub trait IsoReader {
    /// Look up `path` in the image's directory tree.
    fn locate(&self, path: &str) -> Option<DirectoryEntry>;

    /// Read the full contents of `entry` into `buf`, replacing its contents.
    fn read_into(&self, entry: &DirectoryEntry, buf: &mut Vec<u8>) -> io::Result<()>;
}

/// Opens, sizes, and reads host files.
pub trait FileSource {
    type Handle: Read;

    fn open(&self, path: &Path) -> io::Result<Self::Handle>;

    /// Size of the open file in bytes
    fn stat(&self, handle: &Self::Handle) -> io::Result<u64>;

    /// Fill `buf` completely or fail.
    fn read_exact(&self, handle: &mut Self::Handle, buf: &mut [u8]) -> io::Result<()> {
        handle.read_exact(buf)
    }
}

/// [`FileSource`] backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSource;

impl FileSource for StdFileSource {
    type Handle = File;

    fn open(&self, path: &Path) -> io::Result<File> {
        debug!(path = %path.display(), "Opening file for binary read");
        File::open(path)
    }

    fn stat(&self, handle: &File) -> io::Result<u64> {
        let size = handle.metadata()?.len();
        trace!(size, "Stat file");
        Ok(size)
    }
}

/// In-memory disc directory.
///
/// Entries are assigned consecutive 2048-byte sectors in insertion order.
/// The declared length can differ from the stored contents to model damaged
/// directory records.
#[derive(Debug, Default, Clone)]
pub struct MemoryIso {
    entries: BTreeMap<String, (DirectoryEntry, Vec<u8>)>,
    next_lba: u32,
}

impl MemoryIso {
    /// Sector size used to lay out entries
    pub const SECTOR_SIZE: u32 = 2048;

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file whose declared length matches its contents.
    pub fn insert(&mut self, path: impl Into<String>, data: Vec<u8>) -> DirectoryEntry {
        let length = u32::try_from(data.len()).unwrap_or(u32::MAX);
        self.insert_with_length(path, data, length)
    }

    /// Add a file with an explicit declared length.
    pub fn insert_with_length(
        &mut self,
        path: impl Into<String>,
        data: Vec<u8>,
        length: u32,
    ) -> DirectoryEntry {
        let entry = DirectoryEntry {
            lba: self.next_lba,
            length,
        };
        let sectors = (data.len() as u64).div_ceil(u64::from(Self::SECTOR_SIZE)).max(1);
        self.next_lba = self
            .next_lba
            .saturating_add(u32::try_from(sectors).unwrap_or(u32::MAX));
        self.entries.insert(path.into(), (entry, data));
        entry
    }
}

impl IsoReader for MemoryIso {
    fn locate(&self, path: &str) -> Option<DirectoryEntry> {
        self.entries.get(path).map(|(entry, _)| *entry)
    }

    fn read_into(&self, entry: &DirectoryEntry, buf: &mut Vec<u8>) -> io::Result<()> {
        let (_, data) = self
            .entries
            .values()
            .find(|(e, _)| e.lba == entry.lba)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no entry at sector"))?;

        let length = entry.length as usize;
        if data.len() < length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry holds {} of {} bytes", data.len(), length),
            ));
        }
        buf.clear();
        buf.extend_from_slice(&data[..length]);
        Ok(())
    }
}
