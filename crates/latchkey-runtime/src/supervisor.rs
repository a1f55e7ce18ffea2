//! Task lifecycle supervisor.
//!
//! Owns the sending half of every task queue and the handles of the running
//! tasks. Stopping is cooperative: the supervisor sends the channel's stop
//! code (or flips a watch flag) and lets the task drain itself; queues are
//! never yanked out from under a running consumer.

use latchkey_config::DeviceConfig;
use latchkey_core::{IndicatorCode, LockAction};
use std::collections::HashMap;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// A runtime capability the supervisor can start and stop independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Led,
    ColorLight,
    Actuation,
    AltAction,
    Session,
}

impl Capability {
    /// All capabilities, in the order the supervisor evaluates them.
    pub const ALL: [Capability; 5] = [
        Capability::Led,
        Capability::ColorLight,
        Capability::Actuation,
        Capability::AltAction,
        Capability::Session,
    ];

    /// Whether this capability should run under `config`.
    ///
    /// The session always runs; everything else follows its pin
    /// assignments.
    #[must_use]
    pub fn enabled_in(self, config: &DeviceConfig) -> bool {
        match self {
            Capability::Led => config.led.enabled(),
            Capability::ColorLight => config.color_light.enabled(),
            Capability::Actuation => {
                config.actuator.pin_enabled() || config.actuator.dumb_switch_mode
            }
            Capability::AltAction => config.alt_action.enabled(),
            Capability::Session => true,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Capability::Led => "led",
            Capability::ColorLight => "color-light",
            Capability::Actuation => "actuation",
            Capability::AltAction => "alt-action",
            Capability::Session => "session",
        };
        write!(f, "{s}")
    }
}

/// The stop side of a running task's control channel.
#[derive(Debug)]
pub enum StopSignal {
    /// Actuation queue; stop is a lifecycle action on the queue.
    Lock(mpsc::Sender<LockAction>),
    /// Indicator queue; stop is the distinguished stop code.
    Indicator(mpsc::Sender<IndicatorCode>),
    /// Watch-flag stop for tasks without an inbound queue.
    Watch(watch::Sender<bool>),
}

impl StopSignal {
    /// Request the task to stop. Never blocks; a full queue just means the
    /// task will see the close when the sender drops.
    fn request_stop(&self) {
        match self {
            StopSignal::Lock(tx) => {
                let _ = tx.try_send(LockAction::stop());
            }
            StopSignal::Indicator(tx) => {
                let _ = tx.try_send(IndicatorCode::Stop);
            }
            StopSignal::Watch(tx) => {
                let _ = tx.send(true);
            }
        }
    }
}

/// A spawned task together with its stop channel.
#[derive(Debug)]
pub struct RunningTask {
    pub stop: StopSignal,
    pub handle: JoinHandle<()>,
}

/// Spawns tasks for capabilities on demand.
///
/// The factory owns the hardware handles and wiring; the supervisor only
/// decides *when* a capability runs. Returning `None` means the capability
/// cannot be spawned (for example, its hardware was never provided).
pub trait TaskFactory {
    fn spawn(&mut self, capability: Capability) -> Option<RunningTask>;
}

/// Task lifecycle manager.
#[derive(Debug, Default)]
pub struct Supervisor {
    tasks: HashMap<Capability, RunningTask>,
}

impl Supervisor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a capability currently has a live task.
    #[must_use]
    pub fn is_running(&self, capability: Capability) -> bool {
        self.tasks
            .get(&capability)
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Start a capability. No-op when it is already running.
    pub fn start(&mut self, capability: Capability, factory: &mut impl TaskFactory) {
        if self.is_running(capability) {
            tracing::debug!(%capability, "already running");
            return;
        }
        // A finished task may still occupy the slot; replace it.
        self.tasks.remove(&capability);
        match factory.spawn(capability) {
            Some(task) => {
                tracing::info!(%capability, "task started");
                self.tasks.insert(capability, task);
            }
            None => tracing::warn!(%capability, "no task available to start"),
        }
    }

    /// Stop a capability. No-op when it is not running. Best-effort: the
    /// stop request is sent and the handle dropped; the task drains itself.
    pub fn stop(&mut self, capability: Capability) {
        let Some(task) = self.tasks.remove(&capability) else {
            tracing::debug!(%capability, "not running");
            return;
        };
        task.stop.request_stop();
        tracing::info!(%capability, "task stop requested");
        // Dropping the sender closes the queue, which is a stop in itself.
        drop(task);
    }

    /// Stop everything.
    pub fn stop_all(&mut self) {
        for capability in Capability::ALL {
            self.stop(capability);
        }
    }

    /// Reconcile running tasks with a configuration change.
    ///
    /// Capabilities whose pins became assigned start; those whose pins were
    /// cleared stop. The stop request goes out before the caller applies
    /// any pin reassignment, so a task never sees a pin move under it.
    pub fn apply_config(
        &mut self,
        old: &DeviceConfig,
        new: &DeviceConfig,
        factory: &mut impl TaskFactory,
    ) {
        for capability in Capability::ALL {
            let was = capability.enabled_in(old);
            let now = capability.enabled_in(new);
            if was == now {
                continue;
            }
            if now {
                self.start(capability, factory);
            } else {
                self.stop(capability);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_core::constants::QUEUE_DEPTH;
    use std::time::Duration;

    /// Factory spawning trivial queue-draining tasks, counting spawns.
    #[derive(Default)]
    struct CountingFactory {
        spawned: Vec<Capability>,
    }

    impl TaskFactory for CountingFactory {
        fn spawn(&mut self, capability: Capability) -> Option<RunningTask> {
            self.spawned.push(capability);
            Some(match capability {
                Capability::Actuation => {
                    let (tx, mut rx) = mpsc::channel::<LockAction>(QUEUE_DEPTH);
                    let handle = tokio::spawn(async move {
                        while let Some(action) = rx.recv().await {
                            if action.op == latchkey_core::LockOp::Stop {
                                break;
                            }
                        }
                    });
                    RunningTask {
                        stop: StopSignal::Lock(tx),
                        handle,
                    }
                }
                Capability::Led | Capability::ColorLight => {
                    let (tx, mut rx) = mpsc::channel::<IndicatorCode>(QUEUE_DEPTH);
                    let handle = tokio::spawn(async move {
                        while let Some(code) = rx.recv().await {
                            if code == IndicatorCode::Stop {
                                break;
                            }
                        }
                    });
                    RunningTask {
                        stop: StopSignal::Indicator(tx),
                        handle,
                    }
                }
                Capability::AltAction | Capability::Session => {
                    let (tx, mut rx) = watch::channel(false);
                    let handle = tokio::spawn(async move {
                        let _ = rx.wait_for(|stopped| *stopped).await;
                    });
                    RunningTask {
                        stop: StopSignal::Watch(tx),
                        handle,
                    }
                }
            })
        }
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let mut supervisor = Supervisor::new();
        let mut factory = CountingFactory::default();

        supervisor.start(Capability::Led, &mut factory);
        supervisor.start(Capability::Led, &mut factory);

        assert!(supervisor.is_running(Capability::Led));
        assert_eq!(factory.spawned, vec![Capability::Led]);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_cooperative() {
        let mut supervisor = Supervisor::new();
        let mut factory = CountingFactory::default();

        supervisor.start(Capability::Actuation, &mut factory);
        assert!(supervisor.is_running(Capability::Actuation));

        supervisor.stop(Capability::Actuation);
        supervisor.stop(Capability::Actuation); // no-op

        // The task drains its stop code and exits.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!supervisor.is_running(Capability::Actuation));
    }

    #[tokio::test]
    async fn test_restart_after_stop_spawns_fresh_task() {
        let mut supervisor = Supervisor::new();
        let mut factory = CountingFactory::default();

        supervisor.start(Capability::Session, &mut factory);
        supervisor.stop(Capability::Session);
        supervisor.start(Capability::Session, &mut factory);

        assert!(supervisor.is_running(Capability::Session));
        assert_eq!(factory.spawned.len(), 2);
    }

    #[tokio::test]
    async fn test_apply_config_diffs_pin_transitions() {
        let mut supervisor = Supervisor::new();
        let mut factory = CountingFactory::default();

        let old = DeviceConfig::default();
        let mut with_led = DeviceConfig::default();
        with_led.led.success_pin = 10;

        // Baseline: session always runs.
        supervisor.start(Capability::Session, &mut factory);
        factory.spawned.clear();

        supervisor.apply_config(&old, &with_led, &mut factory);
        assert!(supervisor.is_running(Capability::Led));
        assert_eq!(factory.spawned, vec![Capability::Led]);

        // Disabling the pin stops the task; the session is untouched.
        supervisor.apply_config(&with_led, &old, &mut factory);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!supervisor.is_running(Capability::Led));
        assert!(supervisor.is_running(Capability::Session));
    }

    #[tokio::test]
    async fn test_dumb_switch_mode_counts_as_actuation_enabled() {
        let mut config = DeviceConfig::default();
        config.actuator.dumb_switch_mode = true;
        assert!(Capability::Actuation.enabled_in(&config));
        assert!(!Capability::Actuation.enabled_in(&DeviceConfig::default()));
        assert!(Capability::Session.enabled_in(&DeviceConfig::default()));
    }

    #[tokio::test]
    async fn test_stop_all() {
        let mut supervisor = Supervisor::new();
        let mut factory = CountingFactory::default();
        for capability in Capability::ALL {
            supervisor.start(capability, &mut factory);
        }
        supervisor.stop_all();
        tokio::time::sleep(Duration::from_millis(50)).await;
        for capability in Capability::ALL {
            assert!(!supervisor.is_running(capability));
        }
    }
}
