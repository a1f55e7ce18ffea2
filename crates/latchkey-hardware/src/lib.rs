//! Hardware abstraction for the reader firmware.
//!
//! Defines the contract between the runtime tasks and the peripherals they
//! drive: the NFC front-end chip, plain GPIO outputs and inputs, and the
//! color indicator light. Each trait has a mock implementation with a
//! controller handle for driving tests without hardware.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT); they are not object-safe and are meant to be used through
//! generic type parameters.

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use traits::{ColorLight, InputPin, NfcLink, OutputPin};
pub use types::{DetectedTarget, FirmwareVersion, Level, Rgb};
