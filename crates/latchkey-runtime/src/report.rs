//! Lock-state publication.

use latchkey_bus::{BusPublisher, QoS, Topics};
use latchkey_config::ConfigHandle;
use latchkey_core::{LockState, SharedLockState};

/// Couples the shared lock state with its bus publication.
///
/// Every component that moves the observed state goes through this type so
/// the retained state topic and the shared pair never drift apart. Publish
/// failures are logged and swallowed: losing an event never stalls a task.
#[derive(Debug, Clone)]
pub struct StateReporter<B: BusPublisher + Clone> {
    state: SharedLockState,
    bus: B,
    topics: Topics,
    config: ConfigHandle,
}

impl<B: BusPublisher + Clone> StateReporter<B> {
    pub fn new(state: SharedLockState, bus: B, topics: Topics, config: ConfigHandle) -> Self {
        Self {
            state,
            bus,
            topics,
            config,
        }
    }

    /// The shared state this reporter publishes for.
    #[must_use]
    pub fn state(&self) -> &SharedLockState {
        &self.state
    }

    #[must_use]
    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    #[must_use]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Set the observed state and publish it.
    pub async fn set_current(&self, state: LockState) {
        self.state.set_current(state);
        self.publish(state).await;
    }

    /// Publish `state` on the retained state topic, plus the custom-coded
    /// topic when enabled.
    pub async fn publish(&self, state: LockState) {
        let payload = state.to_u8().to_string();
        if let Err(e) = self
            .bus
            .publish(&self.topics.lock_state, payload.as_bytes(), QoS::AtLeastOnce, true)
            .await
        {
            tracing::warn!(error = %e, %state, "failed to publish lock state");
        }

        let policy = self.config.snapshot().policy;
        if policy.publish_custom_state {
            let code = policy.custom_states.code_for(state).to_string();
            if let Err(e) = self
                .bus
                .publish(&self.topics.custom_state, code.as_bytes(), QoS::AtLeastOnce, true)
                .await
            {
                tracing::warn!(error = %e, %state, "failed to publish custom lock state");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_bus::RecordingBus;
    use latchkey_config::DeviceConfig;

    fn reporter(config: DeviceConfig) -> (StateReporter<RecordingBus>, RecordingBus) {
        let bus = RecordingBus::new();
        let reporter = StateReporter::new(
            SharedLockState::new(LockState::Locked),
            bus.clone(),
            Topics::for_client("test"),
            ConfigHandle::new(config),
        );
        (reporter, bus)
    }

    #[tokio::test]
    async fn test_set_current_publishes_retained_code() {
        let (reporter, bus) = reporter(DeviceConfig::default());
        reporter.set_current(LockState::Unlocking).await;

        assert_eq!(reporter.state().current(), LockState::Unlocking);
        let msg = bus.last_on("test/lock/state").unwrap();
        assert_eq!(msg.payload_str(), "4");
        assert!(msg.retain);
        // Custom state publishing is off by default.
        assert!(bus.last_on("test/lock/custom_state").is_none());
    }

    #[tokio::test]
    async fn test_custom_state_published_when_enabled() {
        let mut config = DeviceConfig::default();
        config.policy.publish_custom_state = true;
        config.policy.custom_states.unlocked = 42;
        let (reporter, bus) = reporter(config);

        reporter.set_current(LockState::Unlocked).await;
        assert_eq!(bus.last_on("test/lock/state").unwrap().payload_str(), "0");
        assert_eq!(
            bus.last_on("test/lock/custom_state").unwrap().payload_str(),
            "42"
        );
    }
}
