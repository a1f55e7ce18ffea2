//! CRC-16 in the ISO/IEC 14443-A variant (CRC_A).
//!
//! Polynomial x^16 + x^12 + x^5 + 1, bit-reflected, initial value 0x6363,
//! no final XOR. This is the checksum the contactless stack applies to
//! anticollision frames, and the broadcast frame reuses it.

/// Compute CRC_A over `data`.
///
/// The result is returned as a `u16`; the wire order is little-endian
/// (low byte transmitted first).
///
/// ```
/// // Well-known CRC_A test vector.
/// assert_eq!(latchkey_protocol::crc16_a(&[0x12, 0x34]), 0xCF26);
/// ```
#[must_use]
pub fn crc16_a(data: &[u8]) -> u16 {
    let mut crc: u16 = 0x6363;
    for &byte in data {
        let mut ch = byte ^ (crc as u8);
        ch ^= ch << 4;
        crc = (crc >> 8) ^ (u16::from(ch) << 8) ^ (u16::from(ch) << 3) ^ (u16::from(ch) >> 4);
    }
    crc
}
