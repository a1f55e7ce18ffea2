//! Peripheral trait definitions.
//!
//! These traits establish the contract between the runtime tasks and the
//! peripherals they drive, enabling substitution between mock and real
//! hardware implementations.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT), eliminating the need for the `async_trait` macro. They are NOT
//! object-safe; use generic type parameters:
//!
//! ```no_run
//! use latchkey_hardware::traits::NfcLink;
//! use latchkey_hardware::error::Result;
//! use std::time::Duration;
//!
//! async fn poll_once<L: NfcLink>(link: &mut L) -> Result<bool> {
//!     let target = link.detect_target(Duration::from_millis(500)).await?;
//!     Ok(target.is_some())
//! }
//! ```

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DetectedTarget, FirmwareVersion, Level, Rgb};
use std::time::Duration;

/// The NFC front-end chip link.
///
/// One task owns the link at a time. The session task drives it through
/// poll cycles; on a link-fatal error it lends the link to the reconnect
/// routine, which re-runs [`begin`](NfcLink::begin) and
/// [`configure_field`](NfcLink::configure_field) until the chip answers
/// again.
pub trait NfcLink: Send {
    /// Initialize the transport to the chip.
    ///
    /// # Errors
    ///
    /// Returns an error if the chip does not answer on the bus.
    async fn begin(&mut self) -> Result<()>;

    /// Query the chip firmware version.
    ///
    /// A version of all zeros means the chip is unresponsive; callers
    /// treat that as a failed probe.
    async fn firmware_version(&mut self) -> Result<FirmwareVersion>;

    /// Configure the RF field and security module for passive polling.
    async fn configure_field(&mut self) -> Result<()>;

    /// Write a raw broadcast frame into the field.
    ///
    /// Used for the polling advertisement between detection attempts; the
    /// frame is fire-and-forget and no response is expected.
    async fn broadcast_raw(&mut self, frame: &[u8], timeout: Duration) -> Result<()>;

    /// Wait for a passive target, up to `timeout`.
    ///
    /// Returns `Ok(None)` when no target appeared before the timeout; that
    /// is the normal idle outcome, not an error.
    async fn detect_target(&mut self, timeout: Duration) -> Result<Option<DetectedTarget>>;

    /// Exchange an APDU with the selected target and return the response.
    ///
    /// # Errors
    ///
    /// Returns a communication error if the target left the field mid
    /// exchange.
    async fn exchange(&mut self, apdu: &[u8]) -> Result<Vec<u8>>;

    /// Release the currently selected target.
    async fn release_target(&mut self) -> Result<()>;

    /// Set the passive-activation retry count.
    ///
    /// Zero retries keeps idle polling cheap; a higher count holds a
    /// detected target engaged across authentication.
    async fn set_activation_retries(&mut self, retries: u8) -> Result<()>;
}

/// A GPIO output pin.
///
/// Pin writes are synchronous; there is nothing to await on a memory-mapped
/// register.
pub trait OutputPin: Send {
    /// Drive the pin to the given level.
    fn set_level(&mut self, level: Level) -> Result<()>;

    /// The last level written.
    fn level(&self) -> Level;
}

/// A GPIO input pin.
pub trait InputPin: Send {
    /// Sample the pin level.
    fn read_level(&self) -> Result<Level>;
}

/// An addressable RGB indicator light.
pub trait ColorLight: Send {
    /// Show a solid color.
    async fn set_color(&mut self, color: Rgb) -> Result<()>;

    /// Turn the light off.
    async fn off(&mut self) -> Result<()>;
}
