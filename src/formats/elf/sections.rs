//! Section header table

use crate::formats::elf::table::RecordTable;
use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_cstring, LeRead};

/// View of the section header table inside an image buffer
pub type SectionHeaderTable<'a> = RecordTable<'a, SectionHeader>;

impl Record for SectionHeader {
    const SIZE: usize = SECTION_HEADER_SIZE;

    fn parse(data: &[u8], offset: usize) -> Option<Self> {
        let field = |n: usize| data.read_u32_le(offset.checked_add(n * 4)?);
        Some(SectionHeader {
            sh_name: field(0)?,
            sh_type: field(1)?,
            sh_flags: field(2)?,
            sh_addr: field(3)?,
            sh_offset: field(4)?,
            sh_size: field(5)?,
            sh_link: field(6)?,
            sh_info: field(7)?,
            sh_addralign: field(8)?,
            sh_entsize: field(9)?,
        })
    }
}

impl<'a> SectionHeaderTable<'a> {
    /// Bytes of the section-name string table selected by `shstrndx`.
    ///
    /// `SHN_XINDEX` selects section 0. The slice is clamped to the end of
    /// the buffer; `None` if the index or its offset is out of range.
    pub fn string_table(&self, shstrndx: u16) -> Option<&'a [u8]> {
        let index = if shstrndx == SHN_XINDEX {
            0
        } else {
            usize::from(shstrndx)
        };
        let strtab = self.get(index)?;

        let data = self.data();
        let start = strtab.sh_offset as usize;
        let end = start
            .saturating_add(strtab.sh_size as usize)
            .min(data.len());
        data.get(start..end)
    }

    /// Name of `section`, looked up in the string table selected by `shstrndx`.
    pub fn name_of(&self, section: &SectionHeader, shstrndx: u16) -> Option<&'a str> {
        let strings = self.string_table(shstrndx)?;
        read_cstring(strings, section.sh_name as usize)
    }
}
