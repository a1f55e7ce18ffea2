//! Publisher trait and its test/no-op implementations.

#![allow(async_fn_in_trait)]

use latchkey_core::Result;
use std::sync::{Arc, Mutex};

/// Delivery guarantee requested for a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

/// Outbound half of the message-bus connection.
///
/// Publishing is fire-and-forget from the runtime's point of view: a failed
/// publish is logged by the caller and never stalls a task.
pub trait BusPublisher: Send + Sync {
    /// Publish `payload` on `topic`.
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> Result<()>;
}

/// One publish captured by [`RecordingBus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

impl PublishedMessage {
    /// Payload as UTF-8, for asserting on JSON or numeric-code payloads.
    #[must_use]
    pub fn payload_str(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Mock bus that records every publish for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingBus {
    messages: Arc<Mutex<Vec<PublishedMessage>>>,
}

impl RecordingBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PublishedMessage>> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every publish so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.lock().clone()
    }

    /// Publishes on one topic, in order.
    #[must_use]
    pub fn on_topic(&self, topic: &str) -> Vec<PublishedMessage> {
        self.lock()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// The most recent publish on a topic, if any.
    #[must_use]
    pub fn last_on(&self, topic: &str) -> Option<PublishedMessage> {
        self.lock().iter().rev().find(|m| m.topic == topic).cloned()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl BusPublisher for RecordingBus {
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> Result<()> {
        self.lock().push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }
}

/// Publisher that logs and drops everything.
///
/// Used when the device runs without a broker; the runtime keeps working,
/// the events just go nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBus;

impl BusPublisher for NullBus {
    async fn publish(&self, topic: &str, payload: &[u8], _qos: QoS, _retain: bool) -> Result<()> {
        tracing::debug!(topic, len = payload.len(), "dropping publish, no bus configured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_bus_captures_in_order() {
        let bus = RecordingBus::new();
        bus.publish("a", b"1", QoS::AtMostOnce, false).await.unwrap();
        bus.publish("b", b"2", QoS::AtLeastOnce, true).await.unwrap();
        bus.publish("a", b"3", QoS::AtMostOnce, false).await.unwrap();

        assert_eq!(bus.published().len(), 3);
        let on_a = bus.on_topic("a");
        assert_eq!(on_a.len(), 2);
        assert_eq!(on_a[0].payload_str(), "1");
        assert_eq!(bus.last_on("a").unwrap().payload_str(), "3");
        assert!(bus.last_on("b").unwrap().retain);
        assert!(bus.last_on("missing").is_none());
    }

    #[tokio::test]
    async fn test_clones_share_the_record() {
        let bus = RecordingBus::new();
        let clone = bus.clone();
        clone.publish("t", b"x", QoS::AtMostOnce, false).await.unwrap();
        assert_eq!(bus.published().len(), 1);
    }

    #[tokio::test]
    async fn test_null_bus_accepts_everything() {
        let bus = NullBus;
        bus.publish("anything", b"payload", QoS::ExactlyOnce, true)
            .await
            .unwrap();
    }
}
