//! Program header table

use crate::formats::elf::table::RecordTable;
use crate::formats::elf::types::*;
use crate::formats::elf::utils::LeRead;

/// View of the program header table inside an image buffer
pub type ProgramHeaderTable<'a> = RecordTable<'a, ProgramHeader>;

impl Record for ProgramHeader {
    const SIZE: usize = PROGRAM_HEADER_SIZE;

    fn parse(data: &[u8], offset: usize) -> Option<Self> {
        let field = |n: usize| data.read_u32_le(offset.checked_add(n * 4)?);
        Some(ProgramHeader {
            p_type: field(0)?,
            p_offset: field(1)?,
            p_vaddr: field(2)?,
            p_paddr: field(3)?,
            p_filesz: field(4)?,
            p_memsz: field(5)?,
            p_flags: field(6)?,
            p_align: field(7)?,
        })
    }
}

impl ProgramHeaderTable<'_> {
    /// First segment in table order whose memory range contains `vaddr`.
    ///
    /// Overlapping segments are not ranked; the earliest entry wins.
    pub fn segment_at_vaddr(&self, vaddr: u32) -> Option<ProgramHeader> {
        self.iter().find(|ph| ph.contains_vaddr(vaddr))
    }
}
