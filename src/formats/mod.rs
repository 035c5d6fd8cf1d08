//! Executable header formats understood by the loader

pub mod elf;
pub mod psx;
