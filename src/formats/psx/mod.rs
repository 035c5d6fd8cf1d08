//! PS-X EXE header decoding
//!
//! The header is a fixed 2048-byte block: an 8-byte magic, initial register
//! state and load placement, then reserved space and a marker region.

use crate::formats::elf::utils::LeRead;

/// Size of the PS-X EXE header block
pub const PSX_HEADER_SIZE: usize = 0x800;

/// Magic identifier at offset 0
pub const PSX_MAGIC: &[u8; 8] = b"PS-X EXE";

// Field offsets within the header block.
const OFF_INITIAL_PC: usize = 0x10;
const OFF_INITIAL_GP: usize = 0x14;
const OFF_LOAD_ADDRESS: usize = 0x18;
const OFF_FILE_SIZE: usize = 0x1C;
const OFF_UNK0: usize = 0x20;
const OFF_UNK1: usize = 0x24;
const OFF_MEMFILL_START: usize = 0x28;
const OFF_MEMFILL_SIZE: usize = 0x2C;
const OFF_SP_BASE: usize = 0x30;
const OFF_SP_OFFSET: usize = 0x34;

/// Decoded PS-X EXE header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsxExeHeader {
    pub initial_pc: u32,
    pub initial_gp: u32,
    pub load_address: u32,
    /// Payload size, excluding the 2048-byte header
    pub file_size: u32,
    pub unk0: u32,
    pub unk1: u32,
    pub memfill_start: u32,
    pub memfill_size: u32,
    pub initial_sp_base: u32,
    pub initial_sp_offset: u32,
}

impl PsxExeHeader {
    /// Decode the header at the start of `data`.
    ///
    /// `None` if `data` is shorter than [`PSX_HEADER_SIZE`] or does not start
    /// with [`PSX_MAGIC`].
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < PSX_HEADER_SIZE || !data.starts_with(PSX_MAGIC) {
            return None;
        }

        Some(Self {
            initial_pc: data.read_u32_le(OFF_INITIAL_PC)?,
            initial_gp: data.read_u32_le(OFF_INITIAL_GP)?,
            load_address: data.read_u32_le(OFF_LOAD_ADDRESS)?,
            file_size: data.read_u32_le(OFF_FILE_SIZE)?,
            unk0: data.read_u32_le(OFF_UNK0)?,
            unk1: data.read_u32_le(OFF_UNK1)?,
            memfill_start: data.read_u32_le(OFF_MEMFILL_START)?,
            memfill_size: data.read_u32_le(OFF_MEMFILL_SIZE)?,
            initial_sp_base: data.read_u32_le(OFF_SP_BASE)?,
            initial_sp_offset: data.read_u32_le(OFF_SP_OFFSET)?,
        })
    }

    /// Whether header plus declared payload fits in a buffer of `len` bytes
    pub fn fits_in(&self, len: usize) -> bool {
        u64::from(self.file_size) + PSX_HEADER_SIZE as u64 <= len as u64
    }
}
