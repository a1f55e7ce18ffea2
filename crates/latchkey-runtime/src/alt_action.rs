//! Auxiliary trigger task and the alternate-action arm flag.
//!
//! A physical button arms a time-boxed window; a credential authentication
//! that succeeds inside the window fires the alternate action instead of
//! (or in addition to) the usual lock behavior.

use latchkey_config::ConfigHandle;
use latchkey_core::constants::TASK_POLL_INTERVAL;
use latchkey_hardware::{InputPin, Level, OutputPin};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Process-wide flag marking the alternate-action window as armed.
///
/// Armed by the trigger task, read by the session task and the LED
/// indicator task. Plain atomic: arming and expiry are single flips.
#[derive(Debug, Clone, Default)]
pub struct AltActionFlag {
    armed: Arc<AtomicBool>,
}

impl AltActionFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }
}

/// Run the trigger task until the stop signal fires.
///
/// Polls the input at the task poll interval. A rising edge lights the
/// feedback LED, arms the flag, waits the configured window, then clears
/// both.
pub async fn run<I, P>(
    input: I,
    mut feedback: P,
    flag: AltActionFlag,
    config: ConfigHandle,
    mut stop_rx: watch::Receiver<bool>,
) where
    I: InputPin,
    P: OutputPin,
{
    // Seed from the actual input so a button already held at startup does
    // not read as an edge.
    let mut previous = input.read_level().unwrap_or(Level::Low);

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = sleep(TASK_POLL_INTERVAL) => {}
        }

        let level = match input.read_level() {
            Ok(level) => level,
            Err(e) => {
                tracing::warn!(error = %e, "trigger input read failed");
                continue;
            }
        };

        if previous == Level::Low && level == Level::High {
            let alt = config.snapshot().alt_action;
            tracing::info!("alternate action armed");

            if let Err(e) = feedback.set_level(Level::High) {
                tracing::warn!(error = %e, "feedback LED write failed");
            }
            flag.arm();

            tokio::select! {
                _ = stop_rx.changed() => {
                    flag.clear();
                    break;
                }
                _ = sleep(Duration::from_millis(alt.arm_timeout_ms)) => {}
            }

            flag.clear();
            if let Err(e) = feedback.set_level(Level::Low) {
                tracing::warn!(error = %e, "feedback LED write failed");
            }
            tracing::info!("alternate action window expired");
            // Level is re-read next cycle so a still-held button does not
            // immediately re-arm as a new edge.
            previous = Level::High;
            continue;
        }
        previous = level;
    }
    tracing::info!("trigger task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_config::DeviceConfig;
    use latchkey_hardware::mock::{MockInputPin, MockOutputPin};

    fn config(arm_ms: u64) -> ConfigHandle {
        let mut config = DeviceConfig::default();
        config.alt_action.arm_timeout_ms = arm_ms;
        ConfigHandle::new(config)
    }

    #[test]
    fn test_flag_flips() {
        let flag = AltActionFlag::new();
        assert!(!flag.is_armed());
        flag.arm();
        assert!(flag.is_armed());
        // Clones observe the same flag.
        let clone = flag.clone();
        clone.clear();
        assert!(!flag.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rising_edge_arms_then_window_expires() {
        let (input, input_handle) = MockInputPin::new(Level::Low);
        let (feedback, feedback_handle) = MockOutputPin::new(Level::Low);
        let flag = AltActionFlag::new();
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run(input, feedback, flag.clone(), config(5000), stop_rx));

        // Idle polls see no edge.
        sleep(Duration::from_millis(500)).await;
        assert!(!flag.is_armed());

        input_handle.set_level(Level::High);
        sleep(Duration::from_millis(300)).await;
        assert!(flag.is_armed());
        assert_eq!(feedback_handle.last_write(), Some(Level::High));

        // Window expires on its own.
        sleep(Duration::from_millis(6000)).await;
        assert!(!flag.is_armed());
        assert_eq!(feedback_handle.last_write(), Some(Level::Low));

        stop_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_held_button_does_not_rearm() {
        let (input, input_handle) = MockInputPin::new(Level::Low);
        let (feedback, _feedback_handle) = MockOutputPin::new(Level::Low);
        let flag = AltActionFlag::new();
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run(input, feedback, flag.clone(), config(1000), stop_rx));

        // Let the task seed its initial level before the press.
        sleep(Duration::from_millis(100)).await;
        input_handle.set_level(Level::High);
        sleep(Duration::from_millis(300)).await;
        assert!(flag.is_armed());

        // Window expires while the button is still held; no re-arm.
        sleep(Duration::from_millis(1500)).await;
        assert!(!flag.is_armed());
        sleep(Duration::from_millis(500)).await;
        assert!(!flag.is_armed());

        // Release and press again: a fresh edge arms a new window.
        input_handle.set_level(Level::Low);
        sleep(Duration::from_millis(300)).await;
        input_handle.set_level(Level::High);
        sleep(Duration::from_millis(300)).await;
        assert!(flag.is_armed());

        stop_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_button_held_at_startup_does_not_arm() {
        let (input, input_handle) = MockInputPin::new(Level::High);
        let (feedback, _) = MockOutputPin::new(Level::Low);
        let flag = AltActionFlag::new();
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run(input, feedback, flag.clone(), config(1000), stop_rx));

        // High from the first poll on is not an edge.
        sleep(Duration::from_millis(500)).await;
        assert!(!flag.is_armed());

        // Release then press makes one.
        input_handle.set_level(Level::Low);
        sleep(Duration::from_millis(300)).await;
        input_handle.set_level(Level::High);
        sleep(Duration::from_millis(300)).await;
        assert!(flag.is_armed());

        stop_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_armed_window_clears_flag() {
        let (input, input_handle) = MockInputPin::new(Level::Low);
        let (feedback, _) = MockOutputPin::new(Level::Low);
        let flag = AltActionFlag::new();
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run(input, feedback, flag.clone(), config(60_000), stop_rx));

        // Let the task seed its initial level before the press.
        sleep(Duration::from_millis(100)).await;
        input_handle.set_level(Level::High);
        sleep(Duration::from_millis(300)).await;
        assert!(flag.is_armed());

        stop_tx.send(true).unwrap();
        task.await.unwrap();
        assert!(!flag.is_armed());
    }
}
