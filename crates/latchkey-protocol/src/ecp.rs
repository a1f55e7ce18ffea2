use crate::crc::crc16_a;
use bytes::Bytes;
use std::fmt;

/// Fixed header of the enhanced contactless polling broadcast frame.
///
/// Identifies the frame as an access-control reader advertisement; devices
/// in the field use it to surface the matching credential before the
/// ISO 14443 exchange begins.
pub const ECP_HEADER: [u8; 8] = [0x6A, 0x02, 0xCB, 0x02, 0x06, 0x02, 0x11, 0x00];

/// Total frame length: header + group identifier + CRC_A.
pub const ECP_FRAME_LEN: usize = 18;

/// Length of the reader group identifier field.
pub const ECP_GROUP_ID_LEN: usize = 8;

/// The 18-byte broadcast frame emitted between target detection attempts.
///
/// # Layout
/// ```text
/// offset  0..8   fixed header  6A 02 CB 02 06 02 11 00
/// offset  8..16  reader group identifier, zero-padded to 8 bytes
/// offset 16..18  CRC_A over bytes 0..16, low byte first
/// ```
///
/// The checksum is recomputed on construction and on every group-identifier
/// change, so a frame handed to the NFC link is always internally
/// consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcpFrame {
    data: [u8; ECP_FRAME_LEN],
}

impl EcpFrame {
    /// Build a frame advertising `group_id`.
    ///
    /// Identifiers shorter than 8 bytes are zero-padded on the right;
    /// longer ones are truncated to the first 8 bytes.
    #[must_use]
    pub fn new(group_id: &[u8]) -> Self {
        let mut frame = Self {
            data: [0u8; ECP_FRAME_LEN],
        };
        frame.data[..8].copy_from_slice(&ECP_HEADER);
        frame.write_group_id(group_id);
        frame
    }

    /// Replace the advertised group identifier, recomputing the checksum.
    ///
    /// Writing an identifier equal to the one already advertised leaves the
    /// frame bytes untouched.
    pub fn set_group_id(&mut self, group_id: &[u8]) {
        let mut padded = [0u8; ECP_GROUP_ID_LEN];
        let n = group_id.len().min(ECP_GROUP_ID_LEN);
        padded[..n].copy_from_slice(&group_id[..n]);
        if self.data[8..16] == padded {
            return;
        }
        self.write_group_id(group_id);
    }

    fn write_group_id(&mut self, group_id: &[u8]) {
        let n = group_id.len().min(ECP_GROUP_ID_LEN);
        self.data[8..16].fill(0);
        self.data[8..8 + n].copy_from_slice(&group_id[..n]);
        let crc = crc16_a(&self.data[..16]);
        self.data[16] = (crc & 0xFF) as u8;
        self.data[17] = (crc >> 8) as u8;
    }

    /// The advertised group identifier field, including padding.
    #[inline]
    #[must_use]
    pub fn group_id(&self) -> &[u8] {
        &self.data[8..16]
    }

    /// The complete frame ready for broadcast.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The frame as an owned buffer for queueing toward the link.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data)
    }
}

impl fmt::Display for EcpFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_frame_layout() {
        let frame = EcpFrame::new(&[0xAA; 8]);
        assert_eq!(frame.as_bytes().len(), ECP_FRAME_LEN);
        assert_eq!(&frame.as_bytes()[..8], &ECP_HEADER);
        assert_eq!(frame.group_id(), &[0xAA; 8]);
    }

    #[test]
    fn test_checksum_placement() {
        let frame = EcpFrame::new(&[0x01, 0x02, 0x03]);
        let crc = crc16_a(&frame.as_bytes()[..16]);
        assert_eq!(frame.as_bytes()[16], (crc & 0xFF) as u8);
        assert_eq!(frame.as_bytes()[17], (crc >> 8) as u8);
    }

    #[rstest]
    #[case(&[], [0, 0, 0, 0, 0, 0, 0, 0])]
    #[case(&[0x11], [0x11, 0, 0, 0, 0, 0, 0, 0])]
    #[case(&[1, 2, 3, 4, 5, 6, 7, 8], [1, 2, 3, 4, 5, 6, 7, 8])]
    #[case(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], [1, 2, 3, 4, 5, 6, 7, 8])]
    fn test_group_id_padding(#[case] input: &[u8], #[case] expected: [u8; 8]) {
        let frame = EcpFrame::new(input);
        assert_eq!(frame.group_id(), &expected);
    }

    #[test]
    fn test_set_group_id_recomputes_checksum() {
        let mut frame = EcpFrame::new(&[0x01; 8]);
        let before = frame.as_bytes().to_vec();
        frame.set_group_id(&[0x02; 8]);
        assert_ne!(frame.as_bytes(), &before[..]);
        let crc = crc16_a(&frame.as_bytes()[..16]);
        assert_eq!(frame.as_bytes()[16], (crc & 0xFF) as u8);
        assert_eq!(frame.as_bytes()[17], (crc >> 8) as u8);
    }

    #[test]
    fn test_set_identical_group_id_is_noop() {
        let mut frame = EcpFrame::new(&[0x03, 0x04]);
        let before = frame.clone();
        frame.set_group_id(&[0x03, 0x04]);
        assert_eq!(frame, before);
        // Same bytes after padding also count as identical.
        frame.set_group_id(&[0x03, 0x04, 0x00, 0x00]);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_display_format() {
        let frame = EcpFrame::new(&[]);
        let text = frame.to_string();
        assert!(text.starts_with("6A 02 CB 02 06 02 11 00"));
        assert_eq!(text.split(' ').count(), ECP_FRAME_LEN);
    }
}
