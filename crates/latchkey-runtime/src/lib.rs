//! The concurrent core of the reader firmware.
//!
//! Every long-lived activity is a task communicating over bounded queues:
//! the lock actuation task (sole writer of the actuator pin), the indicator
//! tasks, the auxiliary trigger task, and the NFC session task with its
//! reconnect routine. The supervisor owns the queue senders and starts and
//! stops tasks as configuration changes.

pub mod accessory;
pub mod actuation;
pub mod alt_action;
pub mod auth;
pub mod commands;
pub mod indicator;
pub mod queue;
pub mod report;
pub mod session;
pub mod supervisor;

pub use accessory::AccessoryBridge;
pub use alt_action::AltActionFlag;
pub use auth::{CredentialAuthenticator, MockAuthenticator};
pub use commands::CommandDispatcher;
pub use report::StateReporter;
pub use supervisor::{Capability, RunningTask, StopSignal, Supervisor, TaskFactory};
