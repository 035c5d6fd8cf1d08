#![no_main]
use libfuzzer_sys::fuzz_target;
use psxelf::{BinaryImage, CollectingSink, LoadOptions};
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let options = LoadOptions::with_sink(Arc::new(CollectingSink::new()));
    for is_psx in [false, true] {
        let Ok(image) = BinaryImage::from_bytes_with("<fuzz>", data.to_vec(), is_psx, &options)
        else {
            continue;
        };
        let _ = image.entry_point();
        let _ = image.text_range();
        let _ = image.crc();
        let _ = image.has_valid_psx_header();
        if let Some(table) = image.section_headers() {
            for i in 0..table.available_count() {
                let _ = image.section_name(i);
            }
        }
        image.load_headers();
    }
});
