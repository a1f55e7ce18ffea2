//! Hex formatting helpers for identifiers published on the message bus.

/// Format a byte slice as uppercase hex without separators.
///
/// Used for issuer/endpoint/reader identifiers and raw tag UIDs in bus
/// payloads.
///
/// # Examples
///
/// ```
/// assert_eq!(latchkey_core::hex::encode_upper(&[0x04, 0xAB, 0xCD]), "04ABCD");
/// ```
#[must_use]
pub fn encode_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}
