//! Timing and sizing constants for the reader firmware core.
//!
//! Timeouts in this firmware are fixed and non-adaptive: each value below is
//! a tuning constant for one specific wait, not a knob the runtime adjusts.

use std::time::Duration;

/// Sentinel pin number meaning "function disabled".
///
/// Configuration stores pin assignments as `u8`; assigning 255 to a pin
/// disables the function and stops the owning task.
pub const PIN_DISABLED: u8 = 255;

/// Depth of every inter-task queue.
///
/// Queues carry fixed-size value types and only ever need room for a couple
/// of pending events; anything deeper just hides a stalled consumer.
pub const QUEUE_DEPTH: usize = 2;

/// Bounded timeout for queue sends issued from framework callbacks.
///
/// An accessory-framework callback must never stall on a full queue; after
/// this long the event is dropped and logged.
pub const QUEUE_SEND_TIMEOUT: Duration = Duration::from_millis(50);

/// Poll interval shared by the indicator, actuation and trigger task loops.
pub const TASK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Grace period before the actuation task reads the restored lock state.
///
/// Gives the accessory framework time to finish initializing its
/// characteristics after boot before the first pin write.
pub const ACTUATION_STARTUP_GRACE: Duration = Duration::from_millis(1500);

/// Delay between NFC session cycles when no target is in the field.
pub const SESSION_CYCLE_DELAY: Duration = Duration::from_millis(50);

/// Bounded timeout for passive target detection.
pub const TARGET_DETECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Maximum presence polls while debouncing a departing target.
pub const PRESENCE_DEBOUNCE_BUDGET: u32 = 50;

/// Delay between reconnect attempts.
///
/// The reconnect loop has no retry ceiling; a disconnected reader renders
/// the device non-functional until it comes back, so we retry forever.
pub const RECONNECT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Activation retry count while idle (field polling).
pub const ACTIVATION_RETRIES_IDLE: u8 = 0;

/// Activation retry count while a target is engaged.
pub const ACTIVATION_RETRIES_ENGAGED: u8 = 5;

/// Fallback pulse width for dumb-switch actuation when the configured
/// momentary timeout is zero.
pub const DUMB_SWITCH_DEFAULT_PULSE: Duration = Duration::from_millis(200);
