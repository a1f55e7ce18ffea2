//! Wire formats spoken over the NFC link.
//!
//! Two formats live here: the 18-byte enhanced contactless polling (ECP)
//! broadcast frame emitted between detection attempts, and the ISO 7816
//! select command that opens the credential applet on a detected target.

pub mod apdu;
pub mod crc;
pub mod ecp;

pub use apdu::{SELECT_CREDENTIAL_APPLET, select_succeeded};
pub use crc::crc16_a;
pub use ecp::EcpFrame;
