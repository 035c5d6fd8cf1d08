//! Loaded executable images.
//!
//! A [`BinaryImage`] owns the complete file contents and answers questions
//! about them: entry point, text range, checksum, and where the header tables
//! are. It is populated once by one of the `open_*`/`from_bytes*` functions
//! and read-only afterwards.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};
use crate::formats::elf::{
    ElfFile, ElfHeader, ProgramHeaderTable, Record, RecordTable, SectionHeaderTable,
    ELF_HEADER_SIZE, PROGRAM_HEADER_SIZE, SECTION_HEADER_SIZE,
};
use crate::formats::psx::{PsxExeHeader, PSX_HEADER_SIZE};
use crate::hashing::xor_crc;
use crate::io::{FileSource, IsoReader, StdFileSource};
use crate::logging::{Diagnostic, DiagnosticSink, HeaderTable, TracingSink};

/// Entry point reported for a console executable without a valid header
pub const INVALID_ENTRY_POINT: u32 = 0xFFFF_FFFF;

/// Configuration and diagnostics receiver for one load.
#[derive(Clone)]
pub struct LoadOptions {
    pub config: LoaderConfig,
    pub sink: Arc<dyn DiagnosticSink>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            config: LoaderConfig::default(),
            sink: Arc::new(TracingSink),
        }
    }
}

impl LoadOptions {
    /// Default configuration, diagnostics sent to `sink`
    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            config: LoaderConfig::default(),
            sink,
        }
    }
}

/// Validate a declared ELF size before anything is read.
///
/// `-1` is the "does not exist" sentinel used by byte sources.
pub fn check_elf_size(path: &str, size: i64, limit: u64) -> Result<()> {
    if size >= 0 && size as u64 > limit {
        Err(LoadError::TooLarge { size, limit })
    } else if size == -1 {
        Err(LoadError::NotFound {
            path: path.to_string(),
        })
    } else if size <= ELF_HEADER_SIZE as i64 {
        Err(LoadError::Truncated {
            size,
            minimum: ELF_HEADER_SIZE,
        })
    } else {
        Ok(())
    }
}

/// An ELF or PS-X EXE image held in memory.
pub struct BinaryImage {
    data: Vec<u8>,
    source_name: String,
    is_psx: bool,
    program_header_offset: Option<usize>,
    section_header_offset: Option<usize>,
    sink: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for BinaryImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryImage")
            .field("source_name", &self.source_name)
            .field("len", &self.data.len())
            .field("is_psx", &self.is_psx)
            .field("program_header_offset", &self.program_header_offset)
            .field("section_header_offset", &self.section_header_offset)
            .finish_non_exhaustive()
    }
}

impl BinaryImage {
    /// Load `path` from a disc image with default options.
    pub fn open_iso<R: IsoReader + ?Sized>(path: &str, reader: &R, is_psx: bool) -> Result<Self> {
        Self::open_iso_with(path, reader, is_psx, &LoadOptions::default())
    }

    /// Load `path` from a disc image.
    ///
    /// ELF loads check the directory entry's declared length before reading.
    pub fn open_iso_with<R: IsoReader + ?Sized>(
        path: &str,
        reader: &R,
        is_psx: bool,
        options: &LoadOptions,
    ) -> Result<Self> {
        let span = tracing::debug_span!("open_iso", path = %path, is_psx);
        let _g = span.enter();

        let entry = reader.locate(path).ok_or_else(|| LoadError::NotFound {
            path: path.to_string(),
        })?;
        debug!(lba = entry.lba, length = entry.length, "located disc entry");

        if !is_psx {
            check_elf_size(path, i64::from(entry.length), options.config.max_elf_size)?;
        }

        let mut data = Vec::new();
        reader
            .read_into(&entry, &mut data)
            .map_err(|e| LoadError::io(path, e))?;

        // The reader may hand back less than the directory entry declared.
        if !is_psx {
            let read = i64::try_from(data.len()).unwrap_or(i64::MAX);
            check_elf_size(path, read, options.config.max_elf_size)?;
        }

        Ok(Self::from_parts(path.to_string(), data, is_psx, options))
    }

    /// Load a host file with default options.
    pub fn open_file<P: AsRef<Path>>(path: P, is_psx: bool) -> Result<Self> {
        Self::open_file_with(&StdFileSource, path, is_psx, &LoadOptions::default())
    }

    /// Load a host file through `source`.
    ///
    /// The whole file is read in one pass; ELF loads check the stat size first.
    pub fn open_file_with<S: FileSource, P: AsRef<Path>>(
        source: &S,
        path: P,
        is_psx: bool,
        options: &LoadOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let span = tracing::debug_span!("open_file", path = %name, is_psx);
        let _g = span.enter();

        let mut handle = source.open(path).map_err(|e| LoadError::io(path, e))?;
        let size = source.stat(&handle).map_err(|e| LoadError::io(path, e))?;

        if !is_psx {
            let declared = i64::try_from(size).unwrap_or(i64::MAX);
            check_elf_size(&name, declared, options.config.max_elf_size)?;
        }

        let len = usize::try_from(size).map_err(|_| LoadError::TooLarge {
            size: i64::try_from(size).unwrap_or(i64::MAX),
            limit: usize::MAX as u64,
        })?;
        let mut data = vec![0u8; len];
        source
            .read_exact(&mut handle, &mut data)
            .map_err(|e| LoadError::io(path, e))?;
        debug!(bytes = len, "read file");

        Ok(Self::from_parts(name, data, is_psx, options))
    }

    /// Wrap an in-memory buffer with default options.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>, is_psx: bool) -> Result<Self> {
        Self::from_bytes_with(name, data, is_psx, &LoadOptions::default())
    }

    /// Wrap an in-memory buffer. ELF buffers go through the same size check
    /// as file loads.
    pub fn from_bytes_with(
        name: impl Into<String>,
        data: Vec<u8>,
        is_psx: bool,
        options: &LoadOptions,
    ) -> Result<Self> {
        let name = name.into();
        if !is_psx {
            let declared = i64::try_from(data.len()).unwrap_or(i64::MAX);
            check_elf_size(&name, declared, options.config.max_elf_size)?;
        }
        Ok(Self::from_parts(name, data, is_psx, options))
    }

    fn from_parts(source_name: String, data: Vec<u8>, is_psx: bool, options: &LoadOptions) -> Self {
        let mut image = Self {
            data,
            source_name,
            is_psx,
            program_header_offset: None,
            section_header_offset: None,
            sink: Arc::clone(&options.sink),
        };
        image.init_headers();
        if options.config.dump_headers_on_load {
            image.load_headers();
        }
        image
    }

    /// Locate the ELF header tables. Console executables are left untouched.
    fn init_headers(&mut self) {
        if self.is_psx {
            return;
        }

        debug!(bytes = self.data.len(), "Initializing Elf");
        let (program, section) = locate_tables(&self.data, self.sink.as_ref());
        self.program_header_offset = program;
        self.section_header_offset = section;
    }

    /// Name of the file or disc entry the image came from
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Raw image bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the image is interpreted as a PS-X EXE rather than an ELF
    pub fn is_psx(&self) -> bool {
        self.is_psx
    }

    /// ELF view of the buffer; `None` for console executables
    pub fn elf(&self) -> Option<ElfFile<'_>> {
        if self.is_psx {
            return None;
        }
        ElfFile::parse(&self.data)
    }

    pub fn elf_header(&self) -> Option<ElfHeader> {
        self.elf().map(|elf| *elf.header())
    }

    /// Program header table located at load time
    pub fn program_headers(&self) -> Option<ProgramHeaderTable<'_>> {
        let offset = self.program_header_offset?;
        let header = self.elf_header()?;
        ProgramHeaderTable::new(&self.data, offset, usize::from(header.e_phnum))
    }

    /// Section header table located at load time
    pub fn section_headers(&self) -> Option<SectionHeaderTable<'_>> {
        let offset = self.section_header_offset?;
        let header = self.elf_header()?;
        SectionHeaderTable::new(&self.data, offset, usize::from(header.e_shnum))
    }

    pub fn has_program_headers(&self) -> bool {
        self.program_header_offset.is_some()
    }

    pub fn has_section_headers(&self) -> bool {
        self.section_header_offset.is_some()
    }

    /// Both header tables are present
    pub fn has_headers(&self) -> bool {
        self.has_program_headers() && self.has_section_headers()
    }

    /// Name of section `index`, if both the section and its name are readable
    pub fn section_name(&self, index: usize) -> Option<&str> {
        let header = self.elf_header()?;
        let sections = self.section_headers()?;
        let section = sections.get(index)?;
        sections.name_of(&section, header.e_shstrndx)
    }

    /// Decoded PS-X EXE header, if the buffer is large enough and has the magic
    pub fn psx_header(&self) -> Option<PsxExeHeader> {
        PsxExeHeader::parse(&self.data)
    }

    /// Structural check of the PS-X EXE header.
    ///
    /// A declared payload larger than the buffer is reported but does not
    /// make the header invalid; readers must clamp to [`Self::len`].
    pub fn has_valid_psx_header(&self) -> bool {
        self.validated_psx_header().is_some()
    }

    fn validated_psx_header(&self) -> Option<PsxExeHeader> {
        let header = self.psx_header()?;
        if !header.fits_in(self.data.len()) {
            self.sink.emit(Diagnostic::PsxFileSizeMismatch {
                declared: header.file_size,
                available: self.data.len() - PSX_HEADER_SIZE,
            });
        }
        Some(header)
    }

    /// Address execution starts at.
    ///
    /// Console executables without a valid header yield
    /// [`INVALID_ENTRY_POINT`]. ELF images return `e_entry` as is.
    pub fn entry_point(&self) -> u32 {
        if self.is_psx {
            return self
                .validated_psx_header()
                .map_or(INVALID_ENTRY_POINT, |h| h.initial_pc);
        }
        self.elf_header().map_or(INVALID_ENTRY_POINT, |h| h.e_entry)
    }

    /// `(start, size)` of the first program segment containing the entry
    /// point, or `(0, 0)`.
    pub fn text_range(&self) -> (u32, u32) {
        if self.is_psx {
            return (0, 0);
        }
        let entry = self.entry_point();
        self.program_headers()
            .and_then(|table| table.segment_at_vaddr(entry))
            .map_or((0, 0), |ph| (ph.p_vaddr, ph.p_memsz))
    }

    /// XOR fold of the image's 32-bit words, see [`xor_crc`].
    pub fn crc(&self) -> u32 {
        xor_crc(&self.data)
    }

    /// Report every program and section header to the diagnostics sink.
    pub fn load_headers(&self) {
        if self.is_psx {
            return;
        }
        self.load_program_headers();
        self.load_section_headers();
    }

    fn load_program_headers(&self) {
        let Some(table) = self.program_headers() else {
            return;
        };
        for (index, header) in table.iter().enumerate() {
            self.sink.emit(Diagnostic::ProgramHeaderEntry { index, header });
        }
        self.report_skipped(HeaderTable::Program, &table);
    }

    fn load_section_headers(&self) {
        let Some(header) = self.elf_header() else {
            return;
        };
        if header.e_shoff as usize > self.data.len() {
            return;
        }
        let Some(table) = self.section_headers() else {
            return;
        };
        for (index, section) in table.iter().enumerate() {
            let name = table
                .name_of(&section, header.e_shstrndx)
                .map(str::to_owned);
            self.sink.emit(Diagnostic::SectionHeaderEntry {
                index,
                name,
                header: section,
            });
        }
        self.report_skipped(HeaderTable::Section, &table);
    }

    fn report_skipped<R: Record>(&self, kind: HeaderTable, table: &RecordTable<'_, R>) {
        let (declared, available) = (table.declared_count(), table.available_count());
        if available < declared {
            self.sink.emit(Diagnostic::EntriesSkipped {
                table: kind,
                declared,
                available,
            });
        }
    }
}

/// Find the program and section header tables of the ELF in `data`.
///
/// A table is returned only if its first record is in bounds. Problems are
/// reported to `sink` and never fail the load.
fn locate_tables(data: &[u8], sink: &dyn DiagnosticSink) -> (Option<usize>, Option<usize>) {
    let Some(elf) = ElfFile::parse(data) else {
        return (None, None);
    };
    let header = *elf.header();

    let program = if header.e_phnum > 0 {
        located(
            elf.program_headers(),
            HeaderTable::Program,
            header.e_phoff,
            data.len(),
            sink,
        )
    } else {
        None
    };

    let section = if header.e_shnum > 0 {
        located(
            elf.section_headers(),
            HeaderTable::Section,
            header.e_shoff,
            data.len(),
            sink,
        )
    } else {
        None
    };

    if header.e_shnum > 0 && !elf.has_standard_shentsize() {
        sink.emit(Diagnostic::NonStandardEntrySize {
            table: HeaderTable::Section,
            declared: header.e_shentsize,
            expected: SECTION_HEADER_SIZE,
        });
    }
    if header.e_phnum > 0 && !elf.has_standard_phentsize() {
        sink.emit(Diagnostic::NonStandardEntrySize {
            table: HeaderTable::Program,
            declared: header.e_phentsize,
            expected: PROGRAM_HEADER_SIZE,
        });
    }

    sink.emit(Diagnostic::HeaderSummary {
        size: data.len(),
        header,
    });

    (program, section)
}

fn located<R: Record>(
    table: Option<RecordTable<'_, R>>,
    kind: HeaderTable,
    declared_offset: u32,
    size: usize,
    sink: &dyn DiagnosticSink,
) -> Option<usize> {
    let Some(table) = table else {
        sink.emit(Diagnostic::TableOutOfBounds {
            table: kind,
            offset: declared_offset,
            size,
        });
        return None;
    };

    let available = table.available_count();
    if available < table.declared_count() {
        sink.emit(Diagnostic::TableTruncated {
            table: kind,
            declared: table.declared_count(),
            available,
        });
    }
    Some(table.offset())
}
