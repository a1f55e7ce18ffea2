//! ISO 7816-4 applet selection for the credential exchange.

/// SELECT-by-AID command opening the access credential applet.
///
/// ```text
/// CLA INS P1 P2 Lc  AID                    Le
/// 00  A4  04 00 07  A0 00 00 08 58 01 01  00
/// ```
pub const SELECT_CREDENTIAL_APPLET: [u8; 13] = [
    0x00, 0xA4, 0x04, 0x00, 0x07, 0xA0, 0x00, 0x00, 0x08, 0x58, 0x01, 0x01, 0x00,
];

/// Status word reported by a successful command.
pub const STATUS_SUCCESS: [u8; 2] = [0x90, 0x00];

/// Check a response for the success trailer `90 00`.
///
/// A response shorter than the trailer is a failure, never a panic.
#[inline]
#[must_use]
pub fn select_succeeded(response: &[u8]) -> bool {
    response.len() >= 2 && response[response.len() - 2..] == STATUS_SUCCESS
}
