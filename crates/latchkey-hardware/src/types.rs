//! Value types shared by the hardware traits.

use crate::error::{HardwareError, Result};
use std::fmt;

/// Logical level of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The opposite level.
    #[inline]
    #[must_use]
    pub fn inverted(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    /// Build a level from a boolean, `true` meaning high.
    #[inline]
    #[must_use]
    pub fn from_bool(high: bool) -> Level {
        if high { Level::High } else { Level::Low }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::High => write!(f, "high"),
        }
    }
}

/// RGB color for the indicator light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);

    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Whether every channel is zero.
    #[inline]
    #[must_use]
    pub fn is_off(self) -> bool {
        self == Rgb::OFF
    }
}

/// Minimum UID length in bytes (per ISO 14443).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (per ISO 14443).
pub const MAX_UID_LENGTH: usize = 10;

/// A passive target detected in the RF field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedTarget {
    /// Target unique identifier (4-10 bytes).
    pub uid: Vec<u8>,

    /// Answer to request, type A.
    pub atqa: [u8; 2],

    /// Select acknowledge byte.
    pub sak: u8,

    /// When the target was detected.
    pub detected_at: chrono::DateTime<chrono::Utc>,
}

impl DetectedTarget {
    /// Create a detected target with the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID length is outside the 4-10 byte range
    /// allowed by ISO 14443.
    pub fn new(uid: Vec<u8>, atqa: [u8; 2], sak: u8) -> Result<Self> {
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&uid.len()) {
            return Err(HardwareError::invalid_data(format!(
                "Target UID length must be between {} and {} bytes, got {}",
                MIN_UID_LENGTH,
                MAX_UID_LENGTH,
                uid.len()
            )));
        }
        Ok(Self {
            uid,
            atqa,
            sak,
            detected_at: chrono::Utc::now(),
        })
    }

    /// UID as an uppercase hex string for logging and bus payloads.
    #[must_use]
    pub fn uid_hex(&self) -> String {
        latchkey_core::hex::encode_upper(&self.uid)
    }
}

/// Firmware version reported by the NFC front-end chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    /// IC identifier byte.
    pub ic: u8,
    /// Major version.
    pub version: u8,
    /// Minor revision.
    pub revision: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.version, self.revision)
    }
}
