use crate::{Result, error::Error, hex};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lock state as exposed to the accessory framework and the message bus.
///
/// The numeric codes are wire values: they are what gets published on the
/// lock-state topic and what the state-command topics accept.
///
/// Two instances of this state exist at runtime: *current* (observed /
/// settled) and *target* (desired). `Unlocking` and `Locking` are transient
/// and are only ever valid on *current*, strictly while a physical actuation
/// is in flight; they are never valid targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LockState {
    Unlocked = 0,
    Locked = 1,
    Jammed = 2,
    Unknown = 3,
    Unlocking = 4,
    Locking = 5,
}

impl LockState {
    /// Create a lock state from its wire code.
    ///
    /// # Errors
    /// Returns `Error::InvalidLockState` if the code is not 0-5.
    #[inline]
    pub fn from_u8(code: u8) -> Result<Self> {
        match code {
            0 => Ok(LockState::Unlocked),
            1 => Ok(LockState::Locked),
            2 => Ok(LockState::Jammed),
            3 => Ok(LockState::Unknown),
            4 => Ok(LockState::Unlocking),
            5 => Ok(LockState::Locking),
            _ => Err(Error::InvalidLockState { code }),
        }
    }

    /// Convert the lock state to its wire code.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` if this state may be held as a *target* value.
    ///
    /// Only `Unlocked` and `Locked` are actionable targets; the transient
    /// and fault states describe observations, not intent.
    #[inline]
    #[must_use]
    pub fn is_valid_target(self) -> bool {
        matches!(self, LockState::Unlocked | LockState::Locked)
    }

    /// Returns `true` if this is a transient in-flight state.
    #[inline]
    #[must_use]
    pub fn is_transitional(self) -> bool {
        matches!(self, LockState::Unlocking | LockState::Locking)
    }

    /// The transient state entered while actuating toward this target.
    ///
    /// # Errors
    /// Returns `Error::InvalidTargetState` for non-target states.
    pub fn transitional(self) -> Result<LockState> {
        match self {
            LockState::Unlocked => Ok(LockState::Unlocking),
            LockState::Locked => Ok(LockState::Locking),
            other => Err(Error::InvalidTargetState {
                state: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LockState::Unlocked => "Unlocked",
            LockState::Locked => "Locked",
            LockState::Jammed => "Jammed",
            LockState::Unknown => "Unknown",
            LockState::Unlocking => "Unlocking",
            LockState::Locking => "Locking",
        };
        write!(f, "{s}")
    }
}

/// Context that produced a lock action.
///
/// The source only affects one decision: whether the momentary-pulse
/// behavior applies, via a per-source bit in the configured momentary mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    /// Accessory-framework target-state write.
    HomeKit,
    /// Successful credential authentication.
    Credential,
    /// Anything else (bus commands, lifecycle management).
    Other,
}

impl ActionSource {
    /// Bit used by the momentary-enable mask check.
    #[inline]
    #[must_use]
    pub fn momentary_bit(self) -> u8 {
        match self {
            ActionSource::HomeKit => 0x01,
            ActionSource::Credential => 0x02,
            ActionSource::Other => 0x04,
        }
    }

    /// Check whether momentary pulsing is enabled for this source.
    #[inline]
    #[must_use]
    pub fn momentary_enabled(self, mask: u8) -> bool {
        mask & self.momentary_bit() != 0
    }
}

impl fmt::Display for ActionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSource::HomeKit => write!(f, "HomeKit"),
            ActionSource::Credential => write!(f, "Credential"),
            ActionSource::Other => write!(f, "Other"),
        }
    }
}

/// Operation requested of the actuation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOp {
    /// Actuate toward the current target state.
    Apply,
    /// Lifecycle control: terminate the task. Not a lock command.
    Stop,
}

/// Message consumed exclusively by the lock actuation task.
///
/// A fixed-size value type: queues carry copies, never pointers, so
/// ownership never crosses a task boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockAction {
    pub source: ActionSource,
    pub op: LockOp,
}

impl LockAction {
    /// An `Apply` action from the given source.
    #[must_use]
    pub fn apply(source: ActionSource) -> Self {
        Self {
            source,
            op: LockOp::Apply,
        }
    }

    /// A lifecycle stop request.
    #[must_use]
    pub fn stop() -> Self {
        Self {
            source: ActionSource::Other,
            op: LockOp::Stop,
        }
    }
}

/// Outcome code consumed by an indicator task.
///
/// Codes are channel-local: each indicator task owns its own bounded queue
/// and interprets its own codes. The numeric values match the original
/// firmware's queue payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IndicatorCode {
    /// Drive the failure representation.
    Failure = 0,
    /// Drive the success representation.
    Success = 1,
    /// Pulse the alternate-action output (only while the window is armed).
    AltAction = 2,
    /// Lifecycle control: terminate the task.
    Stop = 255,
}

impl IndicatorCode {
    /// Create an indicator code from its queue byte.
    ///
    /// Unrecognized codes map to `Stop`, matching the original firmware
    /// where any unknown queue value terminated the indicator task.
    #[inline]
    #[must_use]
    pub fn from_u8(code: u8) -> Self {
        match code {
            0 => IndicatorCode::Failure,
            1 => IndicatorCode::Success,
            2 => IndicatorCode::AltAction,
            _ => IndicatorCode::Stop,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// State of the reader-chip link as tracked by the session task.
///
/// The original firmware kept this implicit in control flow; here it is an
/// explicit enum with a validated transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderLinkState {
    /// Chip unresponsive; nobody is polling.
    Disconnected,
    /// Initial bring-up of the chip link.
    Connecting,
    /// Chip configured, not yet polling.
    Ready,
    /// Emitting broadcast frames and detecting targets.
    Polling,
    /// A passive target was detected in the field.
    TargetPresent,
    /// Credential authentication delegated to the engine.
    Authenticating,
    /// Authentication concluded (either way); releasing the target.
    Settled,
    /// The reconnect routine owns the chip; the session task is suspended.
    Reconnecting,
}

impl ReaderLinkState {
    /// Check if transition to `target` is valid from this state.
    ///
    /// `Polling` and `Connecting` may drop to `Disconnected` on any link
    /// I/O failure, which hands the chip to the reconnect routine.
    #[must_use]
    pub fn can_transition_to(self, target: ReaderLinkState) -> bool {
        use ReaderLinkState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting | Reconnecting)
                | (Connecting, Ready | Disconnected)
                | (Ready, Polling)
                | (Polling, TargetPresent | Disconnected)
                | (TargetPresent, Authenticating | Settled)
                | (Authenticating, Settled)
                | (Settled, Polling)
                | (Reconnecting, Ready)
        )
    }
}

impl fmt::Display for ReaderLinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReaderLinkState::Disconnected => "Disconnected",
            ReaderLinkState::Connecting => "Connecting",
            ReaderLinkState::Ready => "Ready",
            ReaderLinkState::Polling => "Polling",
            ReaderLinkState::TargetPresent => "TargetPresent",
            ReaderLinkState::Authenticating => "Authenticating",
            ReaderLinkState::Settled => "Settled",
            ReaderLinkState::Reconnecting => "Reconnecting",
        };
        write!(f, "{s}")
    }
}

/// Authentication protocol profile, selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyFlow {
    /// Fast flow: symmetric, no attestation.
    #[default]
    Fast,
    /// Standard flow: full key agreement.
    Standard,
    /// Attestation flow: standard plus device attestation.
    Attestation,
}

impl fmt::Display for KeyFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFlow::Fast => write!(f, "FAST"),
            KeyFlow::Standard => write!(f, "STANDARD"),
            KeyFlow::Attestation => write!(f, "ATTESTATION"),
        }
    }
}

/// Result status reported by the authentication engine.
///
/// `Failed` is the distinguished failure value; anything else counts as
/// success for actuation and eventing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    /// Flow completed with the named profile.
    Completed(KeyFlow),
    /// Flow failed; no state may be mutated.
    Failed,
}

impl FlowStatus {
    #[inline]
    #[must_use]
    pub fn is_failed(self) -> bool {
        matches!(self, FlowStatus::Failed)
    }
}

/// Tri-state outcome of a delegated authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    /// Identifier of the issuer whose key authenticated, empty on failure.
    pub issuer_id: Vec<u8>,
    /// Identifier of the authenticated endpoint, empty on failure.
    pub endpoint_id: Vec<u8>,
    /// Flow status; `Failed` is the distinguished failure value.
    pub status: FlowStatus,
}

impl AuthOutcome {
    /// A failed outcome with no identifiers.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            issuer_id: Vec::new(),
            endpoint_id: Vec::new(),
            status: FlowStatus::Failed,
        }
    }

    /// Issuer identifier as uppercase hex for bus payloads.
    #[must_use]
    pub fn issuer_hex(&self) -> String {
        hex::encode_upper(&self.issuer_id)
    }

    /// Endpoint identifier as uppercase hex for bus payloads.
    #[must_use]
    pub fn endpoint_hex(&self) -> String {
        hex::encode_upper(&self.endpoint_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, LockState::Unlocked)]
    #[case(1, LockState::Locked)]
    #[case(2, LockState::Jammed)]
    #[case(3, LockState::Unknown)]
    #[case(4, LockState::Unlocking)]
    #[case(5, LockState::Locking)]
    fn test_lock_state_codes(#[case] code: u8, #[case] expected: LockState) {
        assert_eq!(LockState::from_u8(code).unwrap(), expected);
        assert_eq!(expected.to_u8(), code);
    }

    #[test]
    fn test_lock_state_invalid_code() {
        assert!(LockState::from_u8(6).is_err());
        assert!(LockState::from_u8(255).is_err());
    }

    #[test]
    fn test_valid_targets() {
        assert!(LockState::Unlocked.is_valid_target());
        assert!(LockState::Locked.is_valid_target());
        assert!(!LockState::Unlocking.is_valid_target());
        assert!(!LockState::Locking.is_valid_target());
        assert!(!LockState::Jammed.is_valid_target());
        assert!(!LockState::Unknown.is_valid_target());
    }

    #[test]
    fn test_transitional_mapping() {
        assert_eq!(
            LockState::Unlocked.transitional().unwrap(),
            LockState::Unlocking
        );
        assert_eq!(
            LockState::Locked.transitional().unwrap(),
            LockState::Locking
        );
        assert!(LockState::Jammed.transitional().is_err());
    }

    #[rstest]
    #[case(ActionSource::HomeKit, 0x01)]
    #[case(ActionSource::Credential, 0x02)]
    #[case(ActionSource::Other, 0x04)]
    fn test_momentary_bits(#[case] source: ActionSource, #[case] bit: u8) {
        assert_eq!(source.momentary_bit(), bit);
        assert!(source.momentary_enabled(bit));
        assert!(source.momentary_enabled(0xFF));
        assert!(!source.momentary_enabled(0x00));
    }

    #[test]
    fn test_momentary_mask_is_per_source() {
        // HomeKit enabled, credential not
        let mask = ActionSource::HomeKit.momentary_bit();
        assert!(ActionSource::HomeKit.momentary_enabled(mask));
        assert!(!ActionSource::Credential.momentary_enabled(mask));
    }

    #[test]
    fn test_indicator_code_round_trip() {
        assert_eq!(IndicatorCode::from_u8(0), IndicatorCode::Failure);
        assert_eq!(IndicatorCode::from_u8(1), IndicatorCode::Success);
        assert_eq!(IndicatorCode::from_u8(2), IndicatorCode::AltAction);
        assert_eq!(IndicatorCode::from_u8(255), IndicatorCode::Stop);
        // Unknown codes terminate the task, like the original firmware.
        assert_eq!(IndicatorCode::from_u8(7), IndicatorCode::Stop);
        assert_eq!(IndicatorCode::Stop.to_u8(), 255);
    }

    #[rstest]
    #[case(ReaderLinkState::Disconnected, ReaderLinkState::Connecting, true)]
    #[case(ReaderLinkState::Disconnected, ReaderLinkState::Reconnecting, true)]
    #[case(ReaderLinkState::Connecting, ReaderLinkState::Ready, true)]
    #[case(ReaderLinkState::Connecting, ReaderLinkState::Disconnected, true)]
    #[case(ReaderLinkState::Ready, ReaderLinkState::Polling, true)]
    #[case(ReaderLinkState::Polling, ReaderLinkState::TargetPresent, true)]
    #[case(ReaderLinkState::Polling, ReaderLinkState::Disconnected, true)]
    #[case(ReaderLinkState::TargetPresent, ReaderLinkState::Authenticating, true)]
    #[case(ReaderLinkState::TargetPresent, ReaderLinkState::Settled, true)]
    #[case(ReaderLinkState::Authenticating, ReaderLinkState::Settled, true)]
    #[case(ReaderLinkState::Settled, ReaderLinkState::Polling, true)]
    #[case(ReaderLinkState::Reconnecting, ReaderLinkState::Ready, true)]
    #[case(ReaderLinkState::Polling, ReaderLinkState::Authenticating, false)]
    #[case(ReaderLinkState::Settled, ReaderLinkState::TargetPresent, false)]
    #[case(ReaderLinkState::Reconnecting, ReaderLinkState::Polling, false)]
    fn test_link_transitions(
        #[case] from: ReaderLinkState,
        #[case] to: ReaderLinkState,
        #[case] valid: bool,
    ) {
        assert_eq!(from.can_transition_to(to), valid);
    }

    #[test]
    fn test_flow_status() {
        assert!(FlowStatus::Failed.is_failed());
        assert!(!FlowStatus::Completed(KeyFlow::Fast).is_failed());
    }

    #[test]
    fn test_auth_outcome_hex() {
        let outcome = AuthOutcome {
            issuer_id: vec![0xAA, 0xBB],
            endpoint_id: vec![0x01, 0x02],
            status: FlowStatus::Completed(KeyFlow::Standard),
        };
        assert_eq!(outcome.issuer_hex(), "AABB");
        assert_eq!(outcome.endpoint_hex(), "0102");

        let failed = AuthOutcome::failed();
        assert!(failed.status.is_failed());
        assert!(failed.issuer_id.is_empty());
    }

    #[test]
    fn test_lock_action_constructors() {
        let action = LockAction::apply(ActionSource::Credential);
        assert_eq!(action.op, LockOp::Apply);
        assert_eq!(action.source, ActionSource::Credential);
        assert_eq!(LockAction::stop().op, LockOp::Stop);
    }

    #[test]
    fn test_lock_state_serde() {
        let json = serde_json::to_string(&LockState::Unlocking).unwrap();
        assert_eq!(json, "\"unlocking\"");
        let back: LockState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LockState::Unlocking);
    }
}
