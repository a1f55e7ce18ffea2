//! Message-bus command dispatch.
//!
//! Inbound command topics mutate lock state the same way the accessory
//! framework does: target changes go through the bridge and the actuation
//! queue, observed-state corrections go straight to the reporter. The pin
//! is never written from here.

use crate::accessory::AccessoryBridge;
use crate::report::StateReporter;
use latchkey_bus::BusPublisher;
use latchkey_config::ConfigHandle;
use latchkey_core::LockState;

/// Routes inbound bus commands.
#[derive(Debug, Clone)]
pub struct CommandDispatcher<B: BusPublisher + Clone> {
    bridge: AccessoryBridge,
    reporter: StateReporter<B>,
    config: ConfigHandle,
}

impl<B: BusPublisher + Clone> CommandDispatcher<B> {
    pub fn new(bridge: AccessoryBridge, reporter: StateReporter<B>, config: ConfigHandle) -> Self {
        Self {
            bridge,
            reporter,
            config,
        }
    }

    /// Dispatch one inbound message by topic.
    ///
    /// Unknown topics and unparseable payloads are logged and dropped;
    /// a remote peer can never wedge the runtime.
    pub async fn dispatch(&self, topic: &str, payload: &[u8]) {
        let topics = self.reporter.topics().clone();
        let Some(code) = parse_code(payload) else {
            tracing::warn!(topic, "unparseable command payload");
            return;
        };

        if topic == topics.state_cmd {
            self.on_state_cmd(code).await;
        } else if topic == topics.target_state_cmd {
            self.on_target_cmd(code).await;
        } else if topic == topics.current_state_cmd {
            self.on_current_cmd(code).await;
        } else if topic == topics.custom_state_cmd {
            self.on_custom_cmd(code).await;
        } else {
            tracing::warn!(topic, "command on unknown topic");
        }
    }

    /// Combined command: actionable codes drive the target, fault codes
    /// correct the observed state.
    async fn on_state_cmd(&self, code: u8) {
        match LockState::from_u8(code) {
            Ok(state) if state.is_valid_target() => {
                self.request_target(state).await;
            }
            Ok(state @ (LockState::Jammed | LockState::Unknown)) => {
                self.reporter.set_current(state).await;
            }
            Ok(state) => {
                tracing::warn!(%state, "transitional code not accepted on state command");
            }
            Err(e) => tracing::warn!(error = %e, "bad state command"),
        }
    }

    async fn on_target_cmd(&self, code: u8) {
        match LockState::from_u8(code) {
            Ok(state) if state.is_valid_target() => {
                self.request_target(state).await;
            }
            Ok(state) => tracing::warn!(%state, "non-target code on target command"),
            Err(e) => tracing::warn!(error = %e, "bad target command"),
        }
    }

    /// Correct the observed state without actuating.
    async fn on_current_cmd(&self, code: u8) {
        match LockState::from_u8(code) {
            Ok(state) => self.reporter.set_current(state).await,
            Err(e) => tracing::warn!(error = %e, "bad current-state command"),
        }
    }

    /// Custom-coded command, mapped through the configured table.
    /// Transitional codes request actuation toward their end state; the
    /// rest correct the observed state only.
    async fn on_custom_cmd(&self, code: u8) {
        let codes = self.config.snapshot().policy.custom_states;
        match codes.state_for(code) {
            Some(LockState::Unlocking) => self.request_target(LockState::Unlocked).await,
            Some(LockState::Locking) => self.request_target(LockState::Locked).await,
            Some(state) => self.reporter.set_current(state).await,
            None => tracing::warn!(code, "unmapped custom state code"),
        }
    }

    async fn request_target(&self, target: LockState) {
        if let Err(e) = self.bridge.handle_target_update(target).await {
            tracing::warn!(error = %e, %target, "rejected target command");
        }
    }
}

fn parse_code(payload: &[u8]) -> Option<u8> {
    std::str::from_utf8(payload).ok()?.trim().parse().ok()
}
