//! Core types shared across the Latchkey reader firmware.
//!
//! This crate defines the lock state model, the message contracts carried on
//! the bounded task queues, the reader-link state machine, and the guarded
//! shared state used by every task and callback context.

pub mod constants;
pub mod error;
pub mod hex;
pub mod state;
pub mod types;

pub use error::{Error, Result};
pub use state::SharedLockState;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
