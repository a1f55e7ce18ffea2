//! Structured event payloads.

use serde::{Deserialize, Serialize};

/// Published on the auth-event topic after a successful credential
/// authentication. Identifiers are uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSuccessEvent {
    pub issuer_id: String,
    pub endpoint_id: String,
    pub reader_id: String,
    /// Always `true`; distinguishes credential events from raw tag events
    /// for consumers subscribed to both.
    pub homekey: bool,
}

/// Published on the raw-tag topic when a non-credential tag was read.
/// Suppressible by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTagEvent {
    /// Tag UID, uppercase hex.
    pub uid: String,
    /// ATQA bytes, uppercase hex.
    pub atqa: String,
    /// SAK byte, uppercase hex.
    pub sak: String,
    /// Always `false`.
    pub homekey: bool,
}

/// Published when an armed alternate action fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltActionEvent {
    pub reader_id: String,
}
