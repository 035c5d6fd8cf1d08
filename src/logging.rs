//! Logging and diagnostics.
//!
//! Process-wide output goes through the tracing crate. Header validation does
//! not log directly: it reports [`Diagnostic`] values to an injected
//! [`DiagnosticSink`], which by default forwards them to tracing.

use std::fmt;
use std::sync::{Mutex, Once};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{
    fmt::{self as tracing_fmt, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::formats::elf::{ElfHeader, ProgramHeader, SectionHeader};

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`. Subsequent calls are
/// ignored.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = tracing_fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        // Another subscriber may already be installed by the host process.
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();

        info!("psxelf tracing initialized");
    });
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = tracing_fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_current_span(true);

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();

        info!("psxelf tracing initialized (JSON mode)");
    });
}

/// Which header table a diagnostic refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderTable {
    Program,
    Section,
}

impl fmt::Display for HeaderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderTable::Program => write!(f, "Program"),
            HeaderTable::Section => write!(f, "Section"),
        }
    }
}

/// A non-fatal observation made while validating or dumping an image.
///
/// Diagnostics never change what the image accessors return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Decoded ELF header fields, emitted once per ELF load
    HeaderSummary { size: usize, header: ElfHeader },
    /// A header table's first record does not fit in the buffer
    TableOutOfBounds {
        table: HeaderTable,
        offset: u32,
        size: usize,
    },
    /// Declared entry size differs from the fixed ELF32 record size
    NonStandardEntrySize {
        table: HeaderTable,
        declared: u16,
        expected: usize,
    },
    /// Fewer records fit in the buffer than the header declares
    TableTruncated {
        table: HeaderTable,
        declared: usize,
        available: usize,
    },
    /// Header dump stopped before the declared count was reached
    EntriesSkipped {
        table: HeaderTable,
        declared: usize,
        available: usize,
    },
    /// PS-X EXE payload size exceeds the bytes after the header
    PsxFileSizeMismatch { declared: u32, available: usize },
    ProgramHeaderEntry { index: usize, header: ProgramHeader },
    SectionHeaderEntry {
        index: usize,
        name: Option<String>,
        header: SectionHeader,
    },
}

impl Diagnostic {
    /// Level the diagnostic is reported at
    pub fn level(&self) -> Level {
        match self {
            Diagnostic::HeaderSummary { .. }
            | Diagnostic::ProgramHeaderEntry { .. }
            | Diagnostic::SectionHeaderEntry { .. } => Level::DEBUG,
            Diagnostic::TableTruncated { .. }
            | Diagnostic::EntriesSkipped { .. }
            | Diagnostic::PsxFileSizeMismatch { .. } => Level::WARN,
            Diagnostic::TableOutOfBounds { .. } | Diagnostic::NonStandardEntrySize { .. } => {
                Level::ERROR
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::HeaderSummary { size, header } => write!(
                f,
                "(ELF) {} bytes, type {}, machine {}, version {}, entry {:08x}, flags {:08x}, \
                 eh size {:08x}, ph off {:08x}, ph entsize {:08x}, ph num {:08x}, \
                 sh off {:08x}, sh entsize {:08x}, sh num {:08x}, sh strndx {:08x}",
                size,
                header.file_type(),
                header.machine(),
                header.e_version,
                header.e_entry,
                header.e_flags,
                header.e_ehsize,
                header.e_phoff,
                header.e_phentsize,
                header.e_phnum,
                header.e_shoff,
                header.e_shentsize,
                header.e_shnum,
                header.e_shstrndx
            ),
            Diagnostic::TableOutOfBounds {
                table,
                offset,
                size,
            } => write!(
                f,
                "(ELF) {} header offset {} is larger than file size {}",
                table, offset, size
            ),
            Diagnostic::NonStandardEntrySize {
                table,
                declared,
                expected,
            } => write!(
                f,
                "(ELF) Size of {} headers is not standard: {} (expected {})",
                table.to_string().to_lowercase(),
                declared,
                expected
            ),
            Diagnostic::TableTruncated {
                table,
                declared,
                available,
            } => write!(
                f,
                "(ELF) {} header table declares {} entries, only {} fit in the file",
                table, declared, available
            ),
            Diagnostic::EntriesSkipped {
                table,
                declared,
                available,
            } => write!(
                f,
                "(ELF) Skipped {} of {} {} headers past the end of the file",
                declared - available,
                declared,
                table.to_string().to_lowercase()
            ),
            Diagnostic::PsxFileSizeMismatch {
                declared,
                available,
            } => write!(
                f,
                "Incorrect file size in PS-EXE header: {} bytes should not be greater \
                 than {} bytes",
                declared, available
            ),
            Diagnostic::ProgramHeaderEntry { index, header } => {
                write!(f, "Elf32 Program Header [{:x}] type: ", index)?;
                match header.type_name() {
                    Some(name) => write!(f, "{}", name)?,
                    None => write!(f, "unknown {:x}", header.p_type)?,
                }
                write!(
                    f,
                    ", offset {:08x}, vaddr {:08x}, paddr {:08x}, file size {:08x}, \
                     mem size {:08x}, flags {:08x}, palign {:08x}",
                    header.p_offset,
                    header.p_vaddr,
                    header.p_paddr,
                    header.p_filesz,
                    header.p_memsz,
                    header.p_flags,
                    header.p_align
                )
            }
            Diagnostic::SectionHeaderEntry {
                index,
                name,
                header,
            } => {
                write!(
                    f,
                    "ELF32 Section Header [{:x}] {} type: ",
                    index,
                    name.as_deref().unwrap_or("<invalid name>")
                )?;
                match header.type_name() {
                    Some(name) => write!(f, "{}", name)?,
                    None => write!(f, "unknown {:08x}", header.sh_type)?,
                }
                write!(
                    f,
                    ", flags {:08x}, addr {:08x}, offset {:08x}, size {:08x}, link {:08x}, \
                     info {:08x}, addralign {:08x}, entsize {:08x}",
                    header.sh_flags,
                    header.sh_addr,
                    header.sh_offset,
                    header.sh_size,
                    header.sh_link,
                    header.sh_info,
                    header.sh_addralign,
                    header.sh_entsize
                )
            }
        }
    }
}

/// Receiver for [`Diagnostic`]s. Implementations must not fail.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to tracing under the `psxelf::elf` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.level() {
            Level::ERROR => error!(target: "psxelf::elf", "{}", diagnostic),
            Level::WARN => warn!(target: "psxelf::elf", "{}", diagnostic),
            Level::INFO => info!(target: "psxelf::elf", "{}", diagnostic),
            _ => debug!(target: "psxelf::elf", "{}", diagnostic),
        }
    }
}

/// Records diagnostics in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<Diagnostic> {
        self.records
            .lock()
            .map(|mut records| std::mem::take(&mut *records))
            .unwrap_or_default()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut records) = self.records.lock() {
            records.push(diagnostic);
        }
    }
}
