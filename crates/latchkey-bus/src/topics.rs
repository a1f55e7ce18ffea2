//! Topic family derived from the bus client identifier.

/// The topic set the reader publishes and subscribes on.
///
/// Every topic hangs under the client identifier, so multiple readers share
/// a broker without colliding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// Last-will / availability topic.
    pub status: String,
    /// Structured authentication events.
    pub auth_event: String,
    /// Raw (non-credential) tag events.
    pub raw_tag_event: String,
    /// Retained lock state, numeric code.
    pub lock_state: String,
    /// Command: set target for actionable codes, current for fault codes.
    pub state_cmd: String,
    /// Command: set the target state only.
    pub target_state_cmd: String,
    /// Command: set the observed current state only.
    pub current_state_cmd: String,
    /// Retained custom-coded lock state.
    pub custom_state: String,
    /// Command: custom-coded state changes.
    pub custom_state_cmd: String,
    /// Alternate-action pulses.
    pub alt_action: String,
}

impl Topics {
    /// Derive the topic family for `client_id`.
    #[must_use]
    pub fn for_client(client_id: &str) -> Self {
        Self {
            status: format!("{client_id}/status"),
            auth_event: format!("{client_id}/auth"),
            raw_tag_event: format!("{client_id}/tag"),
            lock_state: format!("{client_id}/lock/state"),
            state_cmd: format!("{client_id}/lock/set_state"),
            target_state_cmd: format!("{client_id}/lock/set_target_state"),
            current_state_cmd: format!("{client_id}/lock/set_current_state"),
            custom_state: format!("{client_id}/lock/custom_state"),
            custom_state_cmd: format!("{client_id}/lock/set_custom_state"),
            alt_action: format!("{client_id}/alt_action"),
        }
    }
}
