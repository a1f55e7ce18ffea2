use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // State model errors
    #[error("Invalid lock state code: {code}")]
    InvalidLockState { code: u8 },

    #[error("Invalid target state: {state}")]
    InvalidTargetState { state: String },

    #[error("Invalid link transition from {from} to {to}")]
    InvalidLinkTransition { from: String, to: String },

    // Queue errors
    #[error("Queue full: {queue}")]
    QueueFull { queue: String },

    #[error("Queue closed: {queue}")]
    QueueClosed { queue: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration contradiction: {0}")]
    ConfigContradiction(String),

    // Persistence errors
    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Message bus errors
    #[error("Bus publish failed: {0}")]
    Bus(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
