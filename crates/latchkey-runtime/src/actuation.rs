//! Lock actuation task.
//!
//! Sole writer of the actuator pin. Everything else asks for actuation by
//! queueing a [`LockAction`]; the desired end state always comes from the
//! shared target, never from the message itself.

use crate::report::StateReporter;
use latchkey_bus::BusPublisher;
use latchkey_config::{ActuatorConfig, ConfigHandle};
use latchkey_core::{
    ActionSource, LockAction, LockOp, LockState,
    constants::{ACTUATION_STARTUP_GRACE, DUMB_SWITCH_DEFAULT_PULSE, TASK_POLL_INTERVAL},
};
use latchkey_hardware::{Level, OutputPin};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

/// Run the actuation task until a `Stop` action arrives or the queue
/// closes.
pub async fn run<P, B>(
    mut rx: mpsc::Receiver<LockAction>,
    mut pin: P,
    reporter: StateReporter<B>,
    config: ConfigHandle,
) where
    P: OutputPin,
    B: BusPublisher + Clone,
{
    startup(&mut pin, &reporter, &config).await;

    loop {
        match timeout(TASK_POLL_INTERVAL, rx.recv()).await {
            Err(_) => continue,
            Ok(None) => break,
            Ok(Some(action)) => match action.op {
                LockOp::Stop => break,
                LockOp::Apply => apply(&mut pin, &reporter, &config, action.source).await,
            },
        }
    }
    tracing::info!("actuation task stopped");
}

/// Wait out the boot grace period, then drive the pin once to match the
/// restored state and align the target with it. Publishes nothing.
async fn startup<P, B>(pin: &mut P, reporter: &StateReporter<B>, config: &ConfigHandle)
where
    P: OutputPin,
    B: BusPublisher + Clone,
{
    sleep(ACTUATION_STARTUP_GRACE).await;

    let actuator = config.snapshot().actuator;
    let (current, target) = reporter.state().snapshot();

    if actuator.pin_enabled() && !actuator.dumb_switch_mode {
        let level = level_for(&actuator, current);
        if let Err(e) = pin.set_level(level) {
            tracing::error!(error = %e, "initial actuator write failed");
        }
    }

    if current != target && current.is_valid_target() {
        // Boot restores current from persistence; target follows it.
        if let Err(e) = reporter.state().set_target(current) {
            tracing::error!(error = %e, "failed to align target at startup");
        }
    }

    tracing::info!(%current, "actuation task ready");
}

/// The pin level that represents `state` being settled.
///
/// Anything that is not fully unlocked holds the lock level.
fn level_for(actuator: &ActuatorConfig, state: LockState) -> Level {
    if state == LockState::Unlocked {
        Level::from_bool(actuator.unlock_high)
    } else {
        Level::from_bool(actuator.lock_high())
    }
}

async fn apply<P, B>(
    pin: &mut P,
    reporter: &StateReporter<B>,
    config: &ConfigHandle,
    source: ActionSource,
) where
    P: OutputPin,
    B: BusPublisher + Clone,
{
    let actuator = config.snapshot().actuator;
    let (current, target) = reporter.state().snapshot();

    if actuator.dumb_switch_mode {
        if !actuator.pin_enabled() {
            tracing::error!("dumb-switch mode enabled but no actuator pin assigned");
            return;
        }
        pulse_dumb_switch(pin, reporter, &actuator, current, target).await;
        return;
    }

    if !actuator.pin_enabled() {
        tracing::debug!(%source, "actuator disabled, ignoring lock action");
        return;
    }

    // No short-circuit when the target is already reached: a repeated
    // apply re-writes the level and re-publishes the settled state.
    let transitional = match target.transitional() {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, %target, "refusing to actuate toward invalid target");
            return;
        }
    };
    if current != transitional {
        reporter.set_current(transitional).await;
    }

    if let Err(e) = pin.set_level(level_for(&actuator, target)) {
        tracing::error!(error = %e, "actuator write failed");
        return;
    }

    if target == LockState::Unlocked && source.momentary_enabled(actuator.momentary_mask) {
        momentary_relock(pin, reporter, &actuator).await;
    } else {
        reporter.set_current(target).await;
    }
}

/// Hold the unlock level for the configured timeout, then relock.
///
/// The target is retargeted to `Locked` so the pair settles consistent, but
/// only if nothing moved it while we held the pin.
async fn momentary_relock<P, B>(pin: &mut P, reporter: &StateReporter<B>, actuator: &ActuatorConfig)
where
    P: OutputPin,
    B: BusPublisher + Clone,
{
    sleep(Duration::from_millis(actuator.momentary_timeout_ms)).await;

    if let Err(e) = pin.set_level(Level::from_bool(actuator.lock_high())) {
        tracing::error!(error = %e, "momentary relock write failed");
        return;
    }
    if reporter.state().target() == LockState::Unlocked
        && let Err(e) = reporter.state().set_target(LockState::Locked)
    {
        tracing::error!(error = %e, "momentary retarget failed");
    }
    reporter.set_current(LockState::Locked).await;
}

/// Press, hold, release toward a stateless external lock unit, then settle
/// the state pair immediately. The momentary branch never applies here.
async fn pulse_dumb_switch<P, B>(
    pin: &mut P,
    reporter: &StateReporter<B>,
    actuator: &ActuatorConfig,
    current: LockState,
    target: LockState,
) where
    P: OutputPin,
    B: BusPublisher + Clone,
{
    let Ok(transitional) = target.transitional() else {
        tracing::error!(%target, "refusing to pulse toward invalid target");
        return;
    };
    if current != transitional && current != target {
        reporter.set_current(transitional).await;
    }

    let pulse = actuator.dumb_pulse();
    let hold = if actuator.momentary_timeout_ms > 0 {
        Duration::from_millis(actuator.momentary_timeout_ms)
    } else {
        DUMB_SWITCH_DEFAULT_PULSE
    };

    if let Err(e) = pin.set_level(Level::from_bool(pulse.press_high)) {
        tracing::error!(error = %e, "dumb-switch press failed");
        return;
    }
    sleep(hold).await;
    if let Err(e) = pin.set_level(Level::from_bool(pulse.release_high)) {
        tracing::error!(error = %e, "dumb-switch release failed");
    }

    reporter.set_current(target).await;
}
