//! Bounded-queue send helpers.
//!
//! Two send disciplines exist in the firmware: callbacks use a bounded
//! timeout so they can never stall the framework, and the session task uses
//! non-blocking sends so a stalled consumer only costs a dropped event.

use latchkey_core::{Error, Result};
use std::time::Duration;
use tokio::sync::mpsc;

/// Send with a bounded wait for queue capacity.
///
/// # Errors
///
/// `QueueFull` when capacity did not free up within `timeout`;
/// `QueueClosed` when the receiving task is gone.
pub async fn send_bounded<T>(
    tx: &mpsc::Sender<T>,
    value: T,
    timeout: Duration,
    queue: &str,
) -> Result<()> {
    match tokio::time::timeout(timeout, tx.send(value)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err(Error::QueueClosed {
            queue: queue.to_string(),
        }),
        Err(_) => Err(Error::QueueFull {
            queue: queue.to_string(),
        }),
    }
}

/// Non-blocking send; a full or closed queue is logged and dropped.
pub fn send_or_drop<T>(tx: &mpsc::Sender<T>, value: T, queue: &str) {
    match tx.try_send(value) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::error!(queue, "queue full, dropping event");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::debug!(queue, "queue closed, dropping event");
        }
    }
}
