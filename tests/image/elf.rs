use std::sync::Arc;

use psxelf::formats::elf::{ProgramHeader, PROGRAM_HEADER_SIZE};
use psxelf::logging::HeaderTable;
use psxelf::{BinaryImage, CollectingSink, Diagnostic, LoadError, LoadOptions};

use crate::common::{
    get_u32, put_u16, put_u32, ElfBuilder, E_PHNUM, E_PHOFF, PT_LOAD, SHT_NOBITS, SHT_PROGBITS,
};

fn collecting() -> (Arc<CollectingSink>, LoadOptions) {
    let sink = Arc::new(CollectingSink::new());
    (sink.clone(), LoadOptions::with_sink(sink))
}

#[test]
fn short_buffers_are_truncated() {
    for len in 0..=52 {
        let result = BinaryImage::from_bytes("short.elf", vec![0u8; len], false);
        assert!(
            matches!(result, Err(LoadError::Truncated { .. })),
            "length {} accepted",
            len
        );
    }
    assert!(BinaryImage::from_bytes("ok.elf", vec![0u8; 53], false).is_ok());
}

#[test]
fn program_header_round_trip() {
    let data = ElfBuilder::new(0x0010_0008)
        .segment(PT_LOAD, 0x0010_0000, 0x4000)
        .segment(PT_LOAD, 0x0020_0000, 0x1000)
        .build();
    let phoff = get_u32(&data, E_PHOFF) as usize;
    let image = BinaryImage::from_bytes("round.elf", data.clone(), false).unwrap();

    assert!(image.has_program_headers());
    let first = image.program_headers().unwrap().get(0).unwrap();
    let expected = ProgramHeader {
        p_type: get_u32(&data, phoff),
        p_offset: get_u32(&data, phoff + 4),
        p_vaddr: get_u32(&data, phoff + 8),
        p_paddr: get_u32(&data, phoff + 12),
        p_filesz: get_u32(&data, phoff + 16),
        p_memsz: get_u32(&data, phoff + 20),
        p_flags: get_u32(&data, phoff + 24),
        p_align: get_u32(&data, phoff + 28),
    };
    assert_eq!(first, expected);
    assert_eq!(first.p_vaddr, 0x0010_0000);
}

#[test]
fn program_header_offset_past_end_is_absent() {
    let (sink, options) = collecting();
    let mut data = ElfBuilder::new(0x0010_0008)
        .segment(PT_LOAD, 0x0010_0000, 0x4000)
        .build();
    let len = data.len();
    let phoff = (len - PROGRAM_HEADER_SIZE + 1) as u32;
    put_u32(&mut data, E_PHOFF, phoff);

    let image = BinaryImage::from_bytes_with("oob.elf", data, false, &options).unwrap();
    assert!(!image.has_program_headers());
    assert!(image.program_headers().is_none());
    assert_eq!(image.text_range(), (0, 0));
    assert!(sink.diagnostics().contains(&Diagnostic::TableOutOfBounds {
        table: HeaderTable::Program,
        offset: phoff,
        size: len,
    }));
}

#[test]
fn program_header_offset_at_last_record_is_present() {
    let mut data = ElfBuilder::new(0x0010_0008)
        .segment(PT_LOAD, 0x0010_0000, 0x4000)
        .build();
    let phoff = (data.len() - PROGRAM_HEADER_SIZE) as u32;
    put_u32(&mut data, E_PHOFF, phoff);

    let image = BinaryImage::from_bytes("edge.elf", data, false).unwrap();
    assert!(image.has_program_headers());
}

#[test]
fn program_header_offset_wrapping_is_absent() {
    let mut data = ElfBuilder::new(0).segment(PT_LOAD, 0, 0x100).build();
    put_u32(&mut data, E_PHOFF, u32::MAX);
    let image = BinaryImage::from_bytes("wrap.elf", data, false).unwrap();
    assert!(!image.has_program_headers());
}

#[test]
fn oversized_program_header_count_stops_at_buffer_end() {
    let (sink, options) = collecting();
    let mut data = ElfBuilder::new(0x0010_0008)
        .segment(PT_LOAD, 0x0030_0000, 0x100)
        .build();
    put_u16(&mut data, E_PHNUM, 0xFFFF);

    let image = BinaryImage::from_bytes_with("count.elf", data, false, &options).unwrap();
    let table = image.program_headers().unwrap();
    assert_eq!(table.declared_count(), 0xFFFF);
    assert!(table.available_count() < 0xFFFF);
    assert_eq!(image.text_range(), (0, 0));
    image.load_headers();

    let diags = sink.diagnostics();
    assert!(diags.iter().any(|d| matches!(
        d,
        Diagnostic::TableTruncated {
            table: HeaderTable::Program,
            declared: 0xFFFF,
            ..
        }
    )));
    let dumped = diags
        .iter()
        .filter(|d| matches!(d, Diagnostic::ProgramHeaderEntry { .. }))
        .count();
    assert_eq!(dumped, table.available_count());
    assert!(diags.contains(&Diagnostic::EntriesSkipped {
        table: HeaderTable::Program,
        declared: 0xFFFF,
        available: table.available_count(),
    }));
}

#[test]
fn complete_tables_dump_without_skipping() {
    let (sink, options) = collecting();
    let data = ElfBuilder::new(0x0010_0008)
        .segment(PT_LOAD, 0x0010_0000, 0x100)
        .section(".text", SHT_PROGBITS)
        .build();
    let image = BinaryImage::from_bytes_with("full.elf", data, false, &options).unwrap();
    image.load_headers();
    assert!(!sink
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::EntriesSkipped { .. })));
}

#[test]
fn text_range_first_containing_segment_wins() {
    let data = ElfBuilder::new(0x0010_0100)
        .segment(PT_LOAD, 0x0000_0000, 0x1000)
        .segment(PT_LOAD, 0x0010_0000, 0x8000)
        .segment(PT_LOAD, 0x0010_0000, 0x200)
        .build();
    let image = BinaryImage::from_bytes("text.elf", data, false).unwrap();
    assert_eq!(image.text_range(), (0x0010_0000, 0x8000));
}

#[test]
fn text_range_end_is_exclusive() {
    let data = ElfBuilder::new(0x0010_1000)
        .segment(PT_LOAD, 0x0010_0000, 0x1000)
        .build();
    let image = BinaryImage::from_bytes("edge.elf", data, false).unwrap();
    assert_eq!(image.text_range(), (0, 0));
}

#[test]
fn text_range_end_wraps_at_top_of_address_space() {
    // 0xFFFF_F000 + 0x2000 wraps to 0x1000, so the entry is not inside.
    let data = ElfBuilder::new(0xFFFF_FFF0)
        .segment(PT_LOAD, 0xFFFF_F000, 0x2000)
        .build();
    let image = BinaryImage::from_bytes("top.elf", data, false).unwrap();
    assert!(image.has_program_headers());
    assert_eq!(image.text_range(), (0, 0));
}

#[test]
fn text_range_absent_without_program_headers() {
    let data = ElfBuilder::new(0x0010_0000).section(".text", SHT_PROGBITS).build();
    let image = BinaryImage::from_bytes("noph.elf", data, false).unwrap();
    assert!(!image.has_program_headers());
    assert!(image.has_section_headers());
    assert!(!image.has_headers());
    assert_eq!(image.text_range(), (0, 0));
}

#[test]
fn non_standard_entry_size_keeps_fixed_stride() {
    let (sink, options) = collecting();
    let mut builder = ElfBuilder::new(0x0010_0010)
        .segment(PT_LOAD, 0x0000_0000, 0x10)
        .segment(PT_LOAD, 0x0010_0000, 0x100);
    builder.phentsize = 0x7FFF;
    let image =
        BinaryImage::from_bytes_with("stride.elf", builder.build(), false, &options).unwrap();

    assert!(image.has_program_headers());
    assert_eq!(image.text_range(), (0x0010_0000, 0x100));
    assert!(sink.diagnostics().contains(&Diagnostic::NonStandardEntrySize {
        table: HeaderTable::Program,
        declared: 0x7FFF,
        expected: 32,
    }));
}

#[test]
fn headers_and_names_are_dumped() {
    let (sink, options) = collecting();
    let data = ElfBuilder::new(0x0010_0000)
        .segment(PT_LOAD, 0x0010_0000, 0x100)
        .section(".text", SHT_PROGBITS)
        .section(".bss", SHT_NOBITS)
        .build();
    let image = BinaryImage::from_bytes_with("dump.elf", data, false, &options).unwrap();
    assert!(image.has_headers());
    assert_eq!(image.section_name(0), Some(".text"));
    assert_eq!(image.section_name(1), Some(".bss"));
    assert_eq!(image.section_name(2), Some(".shstrtab"));
    assert_eq!(image.section_name(3), None);

    sink.take();
    image.load_headers();
    let diags = sink.take();
    let programs = diags
        .iter()
        .filter(|d| matches!(d, Diagnostic::ProgramHeaderEntry { .. }))
        .count();
    let names: Vec<Option<String>> = diags
        .iter()
        .filter_map(|d| match d {
            Diagnostic::SectionHeaderEntry { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(programs, 1);
    assert_eq!(
        names,
        vec![
            Some(".text".to_string()),
            Some(".bss".to_string()),
            Some(".shstrtab".to_string())
        ]
    );
}

#[test]
fn dump_on_load_from_config() {
    let (sink, mut options) = collecting();
    options.config.dump_headers_on_load = true;
    let data = ElfBuilder::new(0x0010_0000)
        .segment(PT_LOAD, 0x0010_0000, 0x100)
        .build();
    BinaryImage::from_bytes_with("auto.elf", data, false, &options).unwrap();
    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::ProgramHeaderEntry { index: 0, .. })));
}

#[test]
fn crc_is_deterministic_and_ignores_word_order() {
    let data = ElfBuilder::new(0x0010_0000)
        .segment(PT_LOAD, 0x0010_0000, 0x100)
        .build();
    let image = BinaryImage::from_bytes("crc.elf", data.clone(), false).unwrap();
    assert_eq!(image.crc(), image.crc());

    // XOR folding is commutative: swapping two words keeps the fingerprint.
    let mut swapped = data.clone();
    let a: [u8; 4] = swapped[0..4].try_into().unwrap();
    let b: [u8; 4] = swapped[24..28].try_into().unwrap();
    assert_ne!(a, b);
    swapped[0..4].copy_from_slice(&b);
    swapped[24..28].copy_from_slice(&a);
    let swapped_image = BinaryImage::from_bytes("crc2.elf", swapped, false).unwrap();
    assert_eq!(swapped_image.crc(), image.crc());

    // Changing a word's value does change it.
    let mut changed = data;
    changed[60] ^= 0x01;
    let changed_image = BinaryImage::from_bytes("crc3.elf", changed, false).unwrap();
    assert_ne!(changed_image.crc(), image.crc());
}
