//! Bounds-checked little-endian field access

/// Little-endian integer reads that fail instead of panicking on short input.
pub trait LeRead {
    fn read_u16_le(&self, offset: usize) -> Option<u16>;
    fn read_u32_le(&self, offset: usize) -> Option<u32>;
}

impl LeRead for [u8] {
    fn read_u16_le(&self, offset: usize) -> Option<u16> {
        let bytes = self.get(offset..offset.checked_add(2)?)?;
        Some(u16::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_u32_le(&self, offset: usize) -> Option<u32> {
        let bytes = self.get(offset..offset.checked_add(4)?)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }
}

/// Read a null-terminated string, stopping at the end of `data` if no
/// terminator is present.
pub fn read_cstring(data: &[u8], offset: usize) -> Option<&str> {
    let slice = data.get(offset..)?;
    let end = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());
    std::str::from_utf8(&slice[..end]).ok()
}

/// Check that `size` bytes at `offset` lie inside a buffer of `data_len` bytes.
pub fn check_bounds(offset: usize, size: usize, data_len: usize) -> bool {
    offset
        .checked_add(size)
        .is_some_and(|end| end <= data_len)
}
