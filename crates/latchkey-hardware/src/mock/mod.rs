//! Mock peripheral implementations for testing and development.
//!
//! Each mock comes as a `(device, handle)` pair: the device implements the
//! hardware trait and is moved into the task under test, while the handle
//! stays with the test to inject stimuli and inspect what the task did.

mod gpio;
mod light;
mod nfc;

pub use gpio::{MockInputPin, MockInputPinHandle, MockOutputPin, MockOutputPinHandle};
pub use light::{MockColorLight, MockColorLightHandle};
pub use nfc::{MockNfc, MockNfcHandle, NfcCommand};
