//! Error types for hardware operations.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while driving a peripheral.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has stopped responding.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after the specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from the device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Whether this error indicates the chip link itself is gone, meaning
    /// the session must hand the link to the reconnect routine.
    #[must_use]
    pub fn is_link_fatal(&self) -> bool {
        matches!(
            self,
            Self::Disconnected { .. } | Self::InitializationFailed { .. } | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("PN532");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: PN532");
        assert!(error.is_link_fatal());
    }

    #[test]
    fn test_timeout_error() {
        let error = HardwareError::timeout(500);
        assert_eq!(error.to_string(), "Operation timeout after 500ms");
        assert!(!error.is_link_fatal());
    }

    #[test]
    fn test_communication_error_is_not_link_fatal() {
        // A failed exchange with a target is a cycle failure, not a lost chip.
        let error = HardwareError::communication("target left the field");
        assert!(!error.is_link_fatal());
    }
}
