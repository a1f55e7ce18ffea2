//! Mock NFC front-end for testing and development.
//!
//! Simulates the chip link by maintaining shared scripted state: a
//! presence flag for the target in the field, a queue of canned exchange
//! responses, and a log of every command the device received.

use crate::{
    HardwareError, Result,
    traits::NfcLink,
    types::{DetectedTarget, FirmwareVersion},
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Commands observed by the mock, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NfcCommand {
    Begin,
    FirmwareVersion,
    ConfigureField,
    BroadcastRaw(Vec<u8>),
    DetectTarget,
    Exchange(Vec<u8>),
    ReleaseTarget,
    SetActivationRetries(u8),
}

#[derive(Debug)]
struct MockNfcState {
    connected: bool,
    target: Option<DetectedTarget>,
    exchange_responses: VecDeque<Vec<u8>>,
    firmware: FirmwareVersion,
    activation_retries: u8,
    commands: Vec<NfcCommand>,
}

impl Default for MockNfcState {
    fn default() -> Self {
        Self {
            connected: true,
            target: None,
            exchange_responses: VecDeque::new(),
            firmware: FirmwareVersion {
                ic: 0x32,
                version: 1,
                revision: 6,
            },
            activation_retries: 0,
            commands: Vec::new(),
        }
    }
}

/// Mock NFC chip link.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockNfc;
/// use latchkey_hardware::traits::NfcLink;
/// use latchkey_hardware::types::DetectedTarget;
/// use std::time::Duration;
///
/// #[tokio::main(flavor = "current_thread", start_paused = true)]
/// async fn main() -> latchkey_hardware::Result<()> {
///     let (mut link, handle) = MockNfc::new();
///     link.begin().await?;
///
///     let target = DetectedTarget::new(vec![0x04, 0xAB, 0xCD, 0xEF], [0, 0x04], 0x20)?;
///     handle.present_target(target);
///
///     let found = link.detect_target(Duration::from_millis(500)).await?;
///     assert!(found.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockNfc {
    state: Arc<Mutex<MockNfcState>>,
}

impl MockNfc {
    /// Create a mock link and its controller handle.
    pub fn new() -> (Self, MockNfcHandle) {
        let state = Arc::new(Mutex::new(MockNfcState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockNfcHandle { state },
        )
    }

    fn record(&self, command: NfcCommand) {
        self.lock().commands.push(command);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockNfcState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.lock().connected {
            Ok(())
        } else {
            Err(HardwareError::disconnected("mock NFC"))
        }
    }
}

impl NfcLink for MockNfc {
    async fn begin(&mut self) -> Result<()> {
        self.record(NfcCommand::Begin);
        self.ensure_connected()
    }

    async fn firmware_version(&mut self) -> Result<FirmwareVersion> {
        self.record(NfcCommand::FirmwareVersion);
        self.ensure_connected()?;
        Ok(self.lock().firmware)
    }

    async fn configure_field(&mut self) -> Result<()> {
        self.record(NfcCommand::ConfigureField);
        self.ensure_connected()
    }

    async fn broadcast_raw(&mut self, frame: &[u8], _timeout: Duration) -> Result<()> {
        self.record(NfcCommand::BroadcastRaw(frame.to_vec()));
        self.ensure_connected()
    }

    async fn detect_target(&mut self, timeout: Duration) -> Result<Option<DetectedTarget>> {
        self.record(NfcCommand::DetectTarget);
        self.ensure_connected()?;
        if let Some(target) = self.lock().target.clone() {
            return Ok(Some(target));
        }
        // No target in the field: burn the detection window. Under a paused
        // tokio clock this advances virtual time instead of wall time.
        tokio::time::sleep(timeout).await;
        Ok(self.lock().target.clone())
    }

    async fn exchange(&mut self, apdu: &[u8]) -> Result<Vec<u8>> {
        self.record(NfcCommand::Exchange(apdu.to_vec()));
        self.ensure_connected()?;
        self.lock()
            .exchange_responses
            .pop_front()
            .ok_or_else(|| HardwareError::communication("no scripted response"))
    }

    async fn release_target(&mut self) -> Result<()> {
        self.record(NfcCommand::ReleaseTarget);
        self.ensure_connected()
    }

    async fn set_activation_retries(&mut self, retries: u8) -> Result<()> {
        self.record(NfcCommand::SetActivationRetries(retries));
        self.ensure_connected()?;
        self.lock().activation_retries = retries;
        Ok(())
    }
}

/// Handle for controlling a [`MockNfc`] from a test.
#[derive(Debug, Clone)]
pub struct MockNfcHandle {
    state: Arc<Mutex<MockNfcState>>,
}

impl MockNfcHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, MockNfcState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Place a target in the field; it stays until [`remove_target`] is
    /// called, so repeated presence polls keep seeing it.
    ///
    /// [`remove_target`]: MockNfcHandle::remove_target
    pub fn present_target(&self, target: DetectedTarget) {
        self.lock().target = Some(target);
    }

    /// Take the target out of the field.
    pub fn remove_target(&self) {
        self.lock().target = None;
    }

    /// Queue a canned response for the next `exchange` call.
    pub fn push_exchange_response(&self, response: Vec<u8>) {
        self.lock().exchange_responses.push_back(response);
    }

    /// Simulate the chip dropping off the bus (or coming back).
    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    /// Override the firmware version the chip reports.
    pub fn set_firmware(&self, firmware: FirmwareVersion) {
        self.lock().firmware = firmware;
    }

    /// The activation retry count last written by the device under test.
    #[must_use]
    pub fn activation_retries(&self) -> u8 {
        self.lock().activation_retries
    }

    /// Snapshot of every command the mock has received, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<NfcCommand> {
        self.lock().commands.clone()
    }

    /// Drop the recorded command log.
    pub fn clear_commands(&self) {
        self.lock().commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> DetectedTarget {
        DetectedTarget::new(vec![0x04, 0x11, 0x22, 0x33], [0x00, 0x04], 0x20).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_detect_without_target_times_out_clean() {
        let (mut link, _handle) = MockNfc::new();
        let found = link.detect_target(Duration::from_millis(500)).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detect_with_presented_target() {
        let (mut link, handle) = MockNfc::new();
        handle.present_target(target());
        let found = link.detect_target(Duration::from_millis(500)).await.unwrap();
        assert_eq!(found.unwrap().uid_hex(), "04112233");

        // Presence persists until removed.
        let again = link.detect_target(Duration::from_millis(500)).await.unwrap();
        assert!(again.is_some());

        handle.remove_target();
        let gone = link.detect_target(Duration::from_millis(500)).await.unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_disconnected_link_fails_every_call() {
        let (mut link, handle) = MockNfc::new();
        handle.set_connected(false);
        assert!(link.begin().await.is_err());
        assert!(link.firmware_version().await.is_err());
        assert!(link.release_target().await.is_err());
    }

    #[tokio::test]
    async fn test_exchange_scripted_responses() {
        let (mut link, handle) = MockNfc::new();
        handle.push_exchange_response(vec![0x90, 0x00]);
        let response = link.exchange(&[0x00, 0xA4]).await.unwrap();
        assert_eq!(response, vec![0x90, 0x00]);

        // Script exhausted.
        assert!(link.exchange(&[0x00, 0xA4]).await.is_err());
    }

    #[tokio::test]
    async fn test_command_log_preserves_order() {
        let (mut link, handle) = MockNfc::new();
        link.begin().await.unwrap();
        link.set_activation_retries(5).await.unwrap();
        link.release_target().await.unwrap();

        assert_eq!(
            handle.commands(),
            vec![
                NfcCommand::Begin,
                NfcCommand::SetActivationRetries(5),
                NfcCommand::ReleaseTarget,
            ]
        );
        assert_eq!(handle.activation_retries(), 5);
    }
}
