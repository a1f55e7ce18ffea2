//! Indicator tasks.
//!
//! Each indicator channel is one task over its own bounded queue of
//! [`IndicatorCode`]s, draining at most one code per poll cycle. Channels
//! never share queues, so a burst on one cannot starve the other.

use crate::alt_action::AltActionFlag;
use latchkey_config::{ConfigHandle, LedIndicatorConfig};
use latchkey_core::{IndicatorCode, constants::PIN_DISABLED, constants::TASK_POLL_INTERVAL};
use latchkey_hardware::{ColorLight, Level, OutputPin, Rgb};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

/// Run the discrete-LED indicator channel.
///
/// Owns the success and failure LEDs plus the alternate-action output; the
/// latter only pulses when the alt-action window is armed at the moment the
/// code arrives.
pub async fn run_led<P>(
    mut rx: mpsc::Receiver<IndicatorCode>,
    mut success: P,
    mut failure: P,
    mut alt_output: P,
    flag: AltActionFlag,
    config: ConfigHandle,
) where
    P: OutputPin,
{
    loop {
        let code = match timeout(TASK_POLL_INTERVAL, rx.recv()).await {
            Err(_) => continue,
            Ok(None) | Ok(Some(IndicatorCode::Stop)) => break,
            Ok(Some(code)) => code,
        };

        let snapshot = config.snapshot();
        match code {
            IndicatorCode::Success => {
                blink(&mut success, snapshot.led.success_pin, &snapshot.led).await;
            }
            IndicatorCode::Failure => {
                blink(&mut failure, snapshot.led.failure_pin, &snapshot.led).await;
            }
            IndicatorCode::AltAction => {
                if !flag.is_armed() {
                    tracing::debug!("alt-action code outside armed window, ignoring");
                    continue;
                }
                let alt = snapshot.alt_action;
                if alt.output_pin == PIN_DISABLED {
                    continue;
                }
                let active = Level::from_bool(alt.output_active_high);
                pulse(
                    &mut alt_output,
                    active,
                    Duration::from_millis(alt.output_pulse_ms),
                )
                .await;
            }
            IndicatorCode::Stop => break,
        }
    }
    tracing::info!("LED indicator task stopped");
}

async fn blink<P: OutputPin>(pin: &mut P, pin_no: u8, led: &LedIndicatorConfig) {
    if pin_no == PIN_DISABLED {
        return;
    }
    let active = Level::from_bool(led.active_high);
    pulse(pin, active, Duration::from_millis(led.duration_ms)).await;
}

async fn pulse<P: OutputPin>(pin: &mut P, active: Level, duration: Duration) {
    if let Err(e) = pin.set_level(active) {
        tracing::warn!(error = %e, "indicator write failed");
        return;
    }
    sleep(duration).await;
    if let Err(e) = pin.set_level(active.inverted()) {
        tracing::warn!(error = %e, "indicator restore failed");
    }
}

/// Run the color-light indicator channel.
///
/// Alt-action codes are not addressed to this channel and are ignored.
pub async fn run_color<L>(mut rx: mpsc::Receiver<IndicatorCode>, mut light: L, config: ConfigHandle)
where
    L: ColorLight,
{
    loop {
        let code = match timeout(TASK_POLL_INTERVAL, rx.recv()).await {
            Err(_) => continue,
            Ok(None) | Ok(Some(IndicatorCode::Stop)) => break,
            Ok(Some(code)) => code,
        };

        let cfg = config.snapshot().color_light;
        let rgb = match code {
            IndicatorCode::Success => cfg.success_rgb,
            IndicatorCode::Failure => cfg.failure_rgb,
            _ => continue,
        };

        let color = Rgb::new(rgb[0], rgb[1], rgb[2]);
        if let Err(e) = light.set_color(color).await {
            tracing::warn!(error = %e, "color indicator write failed");
            continue;
        }
        sleep(Duration::from_millis(cfg.duration_ms)).await;
        if let Err(e) = light.off().await {
            tracing::warn!(error = %e, "color indicator off failed");
        }
    }
    tracing::info!("color indicator task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_config::DeviceConfig;
    use latchkey_core::constants::QUEUE_DEPTH;
    use latchkey_hardware::mock::{MockColorLight, MockOutputPin};

    fn led_config() -> ConfigHandle {
        let mut config = DeviceConfig::default();
        config.led.success_pin = 10;
        config.led.failure_pin = 11;
        config.led.duration_ms = 500;
        config.alt_action.output_pin = 12;
        config.alt_action.output_pulse_ms = 250;
        ConfigHandle::new(config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_blink_restores_idle() {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let (success, success_h) = MockOutputPin::new(Level::Low);
        let (failure, failure_h) = MockOutputPin::new(Level::Low);
        let (alt, _) = MockOutputPin::new(Level::Low);
        let task = tokio::spawn(run_led(
            rx,
            success,
            failure,
            alt,
            AltActionFlag::new(),
            led_config(),
        ));

        tx.send(IndicatorCode::Success).await.unwrap();
        sleep(Duration::from_secs(2)).await;

        assert_eq!(success_h.writes(), vec![Level::High, Level::Low]);
        assert!(failure_h.writes().is_empty());

        tx.send(IndicatorCode::Stop).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_alt_action_pulses_only_when_armed() {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let (success, _) = MockOutputPin::new(Level::Low);
        let (failure, _) = MockOutputPin::new(Level::Low);
        let (alt, alt_h) = MockOutputPin::new(Level::Low);
        let flag = AltActionFlag::new();
        let task = tokio::spawn(run_led(rx, success, failure, alt, flag.clone(), led_config()));

        // Not armed: ignored.
        tx.send(IndicatorCode::AltAction).await.unwrap();
        sleep(Duration::from_secs(1)).await;
        assert!(alt_h.writes().is_empty());

        flag.arm();
        tx.send(IndicatorCode::AltAction).await.unwrap();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(alt_h.writes(), vec![Level::High, Level::Low]);

        tx.send(IndicatorCode::Stop).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_pins_write_nothing() {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let (success, success_h) = MockOutputPin::new(Level::Low);
        let (failure, _) = MockOutputPin::new(Level::Low);
        let (alt, _) = MockOutputPin::new(Level::Low);
        let task = tokio::spawn(run_led(
            rx,
            success,
            failure,
            alt,
            AltActionFlag::new(),
            ConfigHandle::default(),
        ));

        tx.send(IndicatorCode::Success).await.unwrap();
        sleep(Duration::from_secs(1)).await;
        assert!(success_h.writes().is_empty());

        tx.send(IndicatorCode::Stop).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_color_channel_shows_then_clears() {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let (light, light_h) = MockColorLight::new();
        let mut config = DeviceConfig::default();
        config.color_light.pin = 5;
        let task = tokio::spawn(run_color(rx, light, ConfigHandle::new(config)));

        tx.send(IndicatorCode::Failure).await.unwrap();
        sleep(Duration::from_secs(2)).await;
        assert_eq!(light_h.shown(), vec![Rgb::RED, Rgb::OFF]);

        // Alt-action codes are not for this channel.
        tx.send(IndicatorCode::AltAction).await.unwrap();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(light_h.shown().len(), 2);

        tx.send(IndicatorCode::Stop).await.unwrap();
        task.await.unwrap();
    }
}
