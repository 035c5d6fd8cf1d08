//! ELF32 (little-endian) header parser
//!
//! A zero-copy view over an image buffer. Every record is decoded field by
//! field with bounds checks; nothing is reinterpreted in place.

pub mod headers;
pub mod sections;
pub mod segments;
pub mod table;
pub mod types;
pub mod utils;

use headers::parse_header;
pub use sections::SectionHeaderTable;
pub use segments::ProgramHeaderTable;
pub use table::RecordTable;
pub use types::*;

/// ELF header plus lazily located header tables
#[derive(Debug, Clone, Copy)]
pub struct ElfFile<'data> {
    data: &'data [u8],
    header: ElfHeader,
}

impl<'data> ElfFile<'data> {
    /// Decode the ELF header, or `None` if `data` is shorter than 52 bytes.
    pub fn parse(data: &'data [u8]) -> Option<Self> {
        let header = parse_header(data)?;
        Some(Self { data, header })
    }

    /// Get ELF header
    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// Get raw data
    pub fn data(&self) -> &'data [u8] {
        self.data
    }

    /// Program header table, if declared and its first record is in bounds
    pub fn program_headers(&self) -> Option<ProgramHeaderTable<'data>> {
        if self.header.e_phnum == 0 {
            return None;
        }
        ProgramHeaderTable::new(
            self.data,
            self.header.e_phoff as usize,
            usize::from(self.header.e_phnum),
        )
    }

    /// Section header table, if declared and its first record is in bounds
    pub fn section_headers(&self) -> Option<SectionHeaderTable<'data>> {
        if self.header.e_shnum == 0 {
            return None;
        }
        SectionHeaderTable::new(
            self.data,
            self.header.e_shoff as usize,
            usize::from(self.header.e_shnum),
        )
    }

    /// Whether the declared program header stride matches the ELF32 record size
    pub fn has_standard_phentsize(&self) -> bool {
        usize::from(self.header.e_phentsize) == PROGRAM_HEADER_SIZE
    }

    /// Whether the declared section header stride matches the ELF32 record size
    pub fn has_standard_shentsize(&self) -> bool {
        usize::from(self.header.e_shentsize) == SECTION_HEADER_SIZE
    }
}
