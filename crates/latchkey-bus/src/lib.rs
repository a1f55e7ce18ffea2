//! Message-bus integration surface.
//!
//! The runtime publishes through the [`BusPublisher`] trait and never talks
//! to a broker directly; a real client, the recording mock, or the no-op
//! bus can stand behind it interchangeably.

pub mod events;
pub mod publisher;
pub mod topics;

pub use events::{AltActionEvent, AuthSuccessEvent, RawTagEvent};
pub use publisher::{BusPublisher, NullBus, PublishedMessage, QoS, RecordingBus};
pub use topics::Topics;
