//! Image fingerprinting.

/// XOR of every complete little-endian 32-bit word in `data`.
///
/// Trailing bytes that do not form a whole word are ignored. This is a
/// change-detection fingerprint, not a CRC in the polynomial sense: word
/// order does not matter and equal words cancel.
pub fn xor_crc(data: &[u8]) -> u32 {
    data.chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .fold(0, |acc, word| acc ^ word)
}
