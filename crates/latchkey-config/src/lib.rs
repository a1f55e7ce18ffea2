//! Runtime configuration and persistence for the reader firmware.
//!
//! Configuration is live: the supervisor swaps it at runtime and tasks read
//! snapshots through a shared [`ConfigHandle`]. Provisioning data (reader
//! identifiers and enrolled issuers) persists as an opaque serialized blob
//! behind the [`KeyValueStore`] trait.

pub mod bus;
pub mod device;
pub mod reader;
pub mod store;

pub use bus::BusConfig;
pub use device::{
    ActuatorConfig, AltActionConfig, ColorLightConfig, ConfigHandle, CustomStateCodes,
    DeviceConfig, DumbPulseLevels, LedIndicatorConfig, PolicyConfig,
};
pub use reader::{Endpoint, Issuer, ReaderData, READER_DATA_KEY};
pub use store::{KeyValueStore, MemoryStore};
