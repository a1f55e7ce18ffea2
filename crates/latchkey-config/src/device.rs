//! Device configuration model.

use latchkey_core::{LockState, constants::PIN_DISABLED};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Explicit polarity of the dumb-switch pulse.
///
/// `press` is the level written at the start of the pulse, `release` the
/// level restored when it ends. When absent from configuration the pulse
/// presses with the unlock level and releases with the lock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumbPulseLevels {
    /// `true` drives the pin high at pulse start.
    pub press_high: bool,
    /// `true` drives the pin high at pulse end.
    pub release_high: bool,
}

/// Lock actuator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Actuator pin number; 255 disables the actuator.
    pub pin: u8,

    /// `true` if driving the pin high unlocks.
    pub unlock_high: bool,

    /// Per-source momentary enable bits (HomeKit=1, credential=2, other=4).
    pub momentary_mask: u8,

    /// Momentary hold before relocking, in milliseconds. Zero means the
    /// dumb-switch pulse falls back to its 200 ms default.
    pub momentary_timeout_ms: u64,

    /// Dumb-switch mode: pulse a stateless external unit instead of holding
    /// a level.
    pub dumb_switch_mode: bool,

    /// Explicit pulse polarity; defaults to unlock-then-lock levels.
    pub dumb_pulse: Option<DumbPulseLevels>,

    /// Whether a successful credential authentication actuates the lock.
    pub actuate_on_credential: bool,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            pin: PIN_DISABLED,
            unlock_high: true,
            momentary_mask: 0,
            momentary_timeout_ms: 0,
            dumb_switch_mode: false,
            dumb_pulse: None,
            actuate_on_credential: true,
        }
    }
}

impl ActuatorConfig {
    /// Whether the actuator pin is assigned.
    #[inline]
    #[must_use]
    pub fn pin_enabled(&self) -> bool {
        self.pin != PIN_DISABLED
    }

    /// `true` if driving the pin high locks.
    #[inline]
    #[must_use]
    pub fn lock_high(&self) -> bool {
        !self.unlock_high
    }

    /// Resolved dumb-switch pulse polarity.
    #[must_use]
    pub fn dumb_pulse(&self) -> DumbPulseLevels {
        self.dumb_pulse.unwrap_or(DumbPulseLevels {
            press_high: self.unlock_high,
            release_high: self.lock_high(),
        })
    }
}

/// Discrete success/failure LED settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedIndicatorConfig {
    /// Success LED pin; 255 disables it.
    pub success_pin: u8,
    /// Failure LED pin; 255 disables it.
    pub failure_pin: u8,
    /// `true` if the LEDs light when driven high.
    pub active_high: bool,
    /// How long an indication stays lit, in milliseconds.
    pub duration_ms: u64,
}

impl Default for LedIndicatorConfig {
    fn default() -> Self {
        Self {
            success_pin: PIN_DISABLED,
            failure_pin: PIN_DISABLED,
            active_high: true,
            duration_ms: 1000,
        }
    }
}

impl LedIndicatorConfig {
    /// Whether either LED pin is assigned.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.success_pin != PIN_DISABLED || self.failure_pin != PIN_DISABLED
    }
}

/// Addressable color-light indicator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorLightConfig {
    /// Data pin; 255 disables the light.
    pub pin: u8,
    /// Color shown on success, as `[r, g, b]`.
    pub success_rgb: [u8; 3],
    /// Color shown on failure, as `[r, g, b]`.
    pub failure_rgb: [u8; 3],
    /// How long an indication stays shown, in milliseconds.
    pub duration_ms: u64,
}

impl Default for ColorLightConfig {
    fn default() -> Self {
        Self {
            pin: PIN_DISABLED,
            success_rgb: [0, 255, 0],
            failure_rgb: [255, 0, 0],
            duration_ms: 1000,
        }
    }
}

impl ColorLightConfig {
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.pin != PIN_DISABLED
    }
}

/// Auxiliary trigger / alternate-action settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AltActionConfig {
    /// Trigger input pin; 255 disables the whole feature.
    pub trigger_pin: u8,
    /// Feedback LED pin lit while the window is armed; 255 disables it.
    pub feedback_pin: u8,
    /// Alternate-action output pin pulsed on an armed success; 255 disables.
    pub output_pin: u8,
    /// `true` if the output pulses high.
    pub output_active_high: bool,
    /// How long the window stays armed, in milliseconds.
    pub arm_timeout_ms: u64,
    /// Output pulse width, in milliseconds.
    pub output_pulse_ms: u64,
}

impl Default for AltActionConfig {
    fn default() -> Self {
        Self {
            trigger_pin: PIN_DISABLED,
            feedback_pin: PIN_DISABLED,
            output_pin: PIN_DISABLED,
            output_active_high: true,
            arm_timeout_ms: 5000,
            output_pulse_ms: 500,
        }
    }
}

impl AltActionConfig {
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.trigger_pin != PIN_DISABLED
    }
}

/// Numeric codes published on the custom state topic, one per lock state.
///
/// The command direction maps incoming codes back through the same table:
/// unlocking/locking codes set the *target* (and so actuate), the rest set
/// the observed *current* state only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomStateCodes {
    pub unlocked: u8,
    pub locked: u8,
    pub jammed: u8,
    pub unknown: u8,
    pub unlocking: u8,
    pub locking: u8,
}

impl Default for CustomStateCodes {
    fn default() -> Self {
        Self {
            unlocked: 0,
            locked: 1,
            jammed: 2,
            unknown: 3,
            unlocking: 4,
            locking: 5,
        }
    }
}

impl CustomStateCodes {
    /// The custom code published for `state`.
    #[must_use]
    pub fn code_for(&self, state: LockState) -> u8 {
        match state {
            LockState::Unlocked => self.unlocked,
            LockState::Locked => self.locked,
            LockState::Jammed => self.jammed,
            LockState::Unknown => self.unknown,
            LockState::Unlocking => self.unlocking,
            LockState::Locking => self.locking,
        }
    }

    /// The lock state an incoming custom command code maps to.
    #[must_use]
    pub fn state_for(&self, code: u8) -> Option<LockState> {
        // First match wins when codes collide.
        [
            (self.unlocked, LockState::Unlocked),
            (self.locked, LockState::Locked),
            (self.jammed, LockState::Jammed),
            (self.unknown, LockState::Unknown),
            (self.unlocking, LockState::Unlocking),
            (self.locking, LockState::Locking),
        ]
        .into_iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| s)
    }
}

/// What a successful credential authentication does to the lock state when
/// the actuator path is not responsible for settling it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Always drive toward unlocked on success. Wins over `always_lock`.
    pub always_unlock: bool,
    /// Always drive toward locked on success.
    pub always_lock: bool,
    /// Suppress bus events for non-credential tags.
    pub suppress_raw_tag_events: bool,
    /// Publish custom state codes alongside the canonical ones.
    pub publish_custom_state: bool,
    /// The custom code table.
    pub custom_states: CustomStateCodes,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            always_unlock: false,
            always_lock: false,
            suppress_raw_tag_events: false,
            publish_custom_state: false,
            custom_states: CustomStateCodes::default(),
        }
    }
}

/// Complete device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DeviceConfig {
    /// Human-readable device name.
    pub name: String,
    /// Suffix appended to the reader identifier in event payloads.
    pub reader_id_suffix: String,
    pub actuator: ActuatorConfig,
    pub led: LedIndicatorConfig,
    pub color_light: ColorLightConfig,
    pub alt_action: AltActionConfig,
    pub policy: PolicyConfig,
}

/// Shared live-configuration handle.
///
/// Tasks take point-in-time snapshots; the supervisor replaces the whole
/// configuration on reconfiguration. The lock is never held across an
/// await.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<DeviceConfig>>,
}

impl ConfigHandle {
    #[must_use]
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Clone of the current configuration.
    #[must_use]
    pub fn snapshot(&self) -> DeviceConfig {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the configuration wholesale.
    pub fn replace(&self, config: DeviceConfig) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = config;
    }
}
