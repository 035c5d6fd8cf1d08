//! ELF32 header decoding

use crate::formats::elf::types::*;
use crate::formats::elf::utils::LeRead;

/// Decode the 52-byte ELF32 header at the start of `data`.
///
/// Fields are read at fixed little-endian offsets. Returns `None` only when
/// `data` is shorter than the header; magic and class bytes are not checked.
pub fn parse_header(data: &[u8]) -> Option<ElfHeader> {
    if data.len() < ELF_HEADER_SIZE {
        return None;
    }

    let e_ident: [u8; 16] = data.get(0..16)?.try_into().ok()?;

    Some(ElfHeader {
        e_ident,
        e_type: data.read_u16_le(16)?,
        e_machine: data.read_u16_le(18)?,
        e_version: data.read_u32_le(20)?,
        e_entry: data.read_u32_le(24)?,
        e_phoff: data.read_u32_le(28)?,
        e_shoff: data.read_u32_le(32)?,
        e_flags: data.read_u32_le(36)?,
        e_ehsize: data.read_u16_le(40)?,
        e_phentsize: data.read_u16_le(42)?,
        e_phnum: data.read_u16_le(44)?,
        e_shentsize: data.read_u16_le(46)?,
        e_shnum: data.read_u16_le(48)?,
        e_shstrndx: data.read_u16_le(50)?,
    })
}
