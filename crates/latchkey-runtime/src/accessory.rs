//! Accessory-framework bridge.
//!
//! Adapts framework target-state callbacks into lock actions. The bridge
//! never touches the actuator pin; it records intent and passes a message.

use crate::queue::send_bounded;
use latchkey_core::{
    ActionSource, LockAction, LockState, Result, SharedLockState, constants::QUEUE_SEND_TIMEOUT,
};
use tokio::sync::mpsc;

/// Bridge between the accessory framework and the actuation task.
#[derive(Debug, Clone)]
pub struct AccessoryBridge {
    state: SharedLockState,
    actuation_tx: mpsc::Sender<LockAction>,
}

impl AccessoryBridge {
    pub fn new(state: SharedLockState, actuation_tx: mpsc::Sender<LockAction>) -> Self {
        Self {
            state,
            actuation_tx,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SharedLockState {
        &self.state
    }

    /// Handle a target-state write from the framework.
    ///
    /// Records the new target and asks the actuation task to apply it. A
    /// full queue is logged but the update is still reported accepted; the
    /// framework callback must never stall or fail on backpressure.
    ///
    /// # Errors
    ///
    /// Only an invalid target state (a fault or transitional code) is
    /// rejected.
    pub async fn handle_target_update(&self, target: LockState) -> Result<()> {
        self.state.set_target(target)?;
        tracing::info!(%target, "accessory target update");

        if let Err(e) = send_bounded(
            &self.actuation_tx,
            LockAction::apply(ActionSource::HomeKit),
            QUEUE_SEND_TIMEOUT,
            "actuation",
        )
        .await
        {
            tracing::error!(error = %e, "failed to enqueue lock action for accessory update");
        }
        Ok(())
    }
}
