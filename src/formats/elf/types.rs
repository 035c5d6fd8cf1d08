//! Core ELF32 types and constants

use std::fmt;

/// Size of the ELF32 file header
pub const ELF_HEADER_SIZE: usize = 52;
/// Size of one ELF32 program header record
pub const PROGRAM_HEADER_SIZE: usize = 32;
/// Size of one ELF32 section header record
pub const SECTION_HEADER_SIZE: usize = 40;

// Program header types
pub const PT_NULL: u32 = 0;
pub const PT_LOAD: u32 = 1;

// Section header types
pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_REL: u32 = 9;

/// Escape value of `e_shstrndx`; the loader reads the name table from section 0.
pub const SHN_XINDEX: u16 = 0xffff;

/// A fixed-size record decoded field by field from a byte buffer.
pub trait Record: Sized + Copy {
    /// On-disk size of one record; also the stride used for table indexing.
    const SIZE: usize;

    /// Decode the record at `offset`, or `None` if it does not fit in `data`.
    fn parse(data: &[u8], offset: usize) -> Option<Self>;
}

/// ELF file type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfType {
    None,
    Relocatable,
    Executable,
    Other(u16),
}

impl From<u16> for ElfType {
    fn from(val: u16) -> Self {
        match val {
            0 => ElfType::None,
            1 => ElfType::Relocatable,
            2 => ElfType::Executable,
            other => ElfType::Other(other),
        }
    }
}

impl fmt::Display for ElfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElfType::None => write!(f, "no file type"),
            ElfType::Relocatable => write!(f, "relocatable"),
            ElfType::Executable => write!(f, "executable"),
            ElfType::Other(code) => write!(f, "unknown = {:x}", code),
        }
    }
}

/// ELF machine architecture, limited to the codes the loader names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfMachine {
    We32100,
    Sparc,
    X86,
    M68k,
    M88k,
    I860,
    Mips,
    Other(u16),
}

impl From<u16> for ElfMachine {
    fn from(val: u16) -> Self {
        match val {
            1 => ElfMachine::We32100,
            2 => ElfMachine::Sparc,
            3 => ElfMachine::X86,
            4 => ElfMachine::M68k,
            5 => ElfMachine::M88k,
            7 => ElfMachine::I860,
            8 => ElfMachine::Mips,
            other => ElfMachine::Other(other),
        }
    }
}

impl fmt::Display for ElfMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElfMachine::We32100 => write!(f, "AT&T WE 32100"),
            ElfMachine::Sparc => write!(f, "SPARC"),
            ElfMachine::X86 => write!(f, "Intel 80386"),
            ElfMachine::M68k => write!(f, "Motorola 68000"),
            ElfMachine::M88k => write!(f, "Motorola 88000"),
            ElfMachine::I860 => write!(f, "Intel 80860"),
            ElfMachine::Mips => write!(f, "mips_rs3000"),
            ElfMachine::Other(code) => write!(f, "unknown = {:x}", code),
        }
    }
}

/// ELF32 file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    pub e_ident: [u8; 16],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u32,
    pub e_phoff: u32,
    pub e_shoff: u32,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl ElfHeader {
    pub fn file_type(&self) -> ElfType {
        ElfType::from(self.e_type)
    }

    pub fn machine(&self) -> ElfMachine {
        ElfMachine::from(self.e_machine)
    }
}

/// ELF32 program header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_offset: u32,
    pub p_vaddr: u32,
    pub p_paddr: u32,
    pub p_filesz: u32,
    pub p_memsz: u32,
    pub p_flags: u32,
    pub p_align: u32,
}

impl ProgramHeader {
    /// Whether `addr` lies in `[p_vaddr, p_vaddr + p_memsz)`.
    ///
    /// The end is computed in 32 bits and wraps, so a segment crossing the
    /// top of the address space contains nothing above its wrapped end.
    pub fn contains_vaddr(&self, addr: u32) -> bool {
        let start = self.p_vaddr;
        let end = start.wrapping_add(self.p_memsz);
        start <= addr && end > addr
    }

    pub fn type_name(&self) -> Option<&'static str> {
        match self.p_type {
            PT_LOAD => Some("load"),
            _ => None,
        }
    }
}

/// ELF32 section header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u32,
    pub sh_addr: u32,
    pub sh_offset: u32,
    pub sh_size: u32,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u32,
    pub sh_entsize: u32,
}

impl SectionHeader {
    pub fn type_name(&self) -> Option<&'static str> {
        match self.sh_type {
            SHT_NULL => Some("null"),
            SHT_PROGBITS => Some("progbits"),
            SHT_SYMTAB => Some("symtab"),
            SHT_STRTAB => Some("strtab"),
            SHT_RELA => Some("rela"),
            SHT_NOBITS => Some("no bits"),
            SHT_REL => Some("rel"),
            _ => None,
        }
    }
}
