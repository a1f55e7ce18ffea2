//! Guarded shared lock state.
//!
//! The current/target pair is read and written by the actuation task, the
//! accessory bridge, the bus command dispatcher and the session task. All of
//! them hold a clone of [`SharedLockState`]; every access goes through the
//! mutex so readers always observe a coherent pair.

use crate::{Result, error::Error, types::LockState};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StatePair {
    current: LockState,
    target: LockState,
}

/// Clonable handle to the current/target lock state pair.
///
/// Cheap to clone; all clones share one underlying pair. Lock scope is kept
/// to single get/set calls so no task can hold the mutex across an await.
#[derive(Debug, Clone)]
pub struct SharedLockState {
    inner: Arc<Mutex<StatePair>>,
}

impl SharedLockState {
    /// Create a shared state with both members set to `initial`.
    #[must_use]
    pub fn new(initial: LockState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatePair {
                current: initial,
                target: initial,
            })),
        }
    }

    /// Snapshot of the current (observed) state.
    #[must_use]
    pub fn current(&self) -> LockState {
        self.lock().current
    }

    /// Snapshot of the target (desired) state.
    #[must_use]
    pub fn target(&self) -> LockState {
        self.lock().target
    }

    /// Snapshot of `(current, target)` taken under a single lock.
    #[must_use]
    pub fn snapshot(&self) -> (LockState, LockState) {
        let pair = self.lock();
        (pair.current, pair.target)
    }

    /// Set the current (observed) state. Any state is a valid observation.
    pub fn set_current(&self, state: LockState) {
        self.lock().current = state;
    }

    /// Set the target (desired) state.
    ///
    /// # Errors
    /// Returns `Error::InvalidTargetState` if `state` is not an actionable
    /// target (`Unlocked` or `Locked`).
    pub fn set_target(&self, state: LockState) -> Result<()> {
        if !state.is_valid_target() {
            return Err(Error::InvalidTargetState {
                state: state.to_string(),
            });
        }
        self.lock().target = state;
        Ok(())
    }

    /// Set current and target together under a single lock.
    ///
    /// Used when settling after an actuation, where both members must move
    /// as one step.
    ///
    /// # Errors
    /// Returns `Error::InvalidTargetState` if `target` is not actionable.
    pub fn settle(&self, current: LockState, target: LockState) -> Result<()> {
        if !target.is_valid_target() {
            return Err(Error::InvalidTargetState {
                state: target.to_string(),
            });
        }
        let mut pair = self.lock();
        pair.current = current;
        pair.target = target;
        Ok(())
    }

    /// Flip the target to the opposite of the current state.
    ///
    /// Implements the toggle policy: `Locked` becomes `Unlocked` and
    /// anything else becomes `Locked`, taken atomically so a concurrent
    /// writer cannot slip between the read and the write.
    pub fn toggle_target(&self) -> LockState {
        let mut pair = self.lock();
        let next = match pair.current {
            LockState::Unlocked => LockState::Locked,
            _ => LockState::Unlocked,
        };
        pair.target = next;
        next
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatePair> {
        // A poisoned mutex means a panicking task; the pair itself is always
        // coherent, so recover the guard rather than cascade the panic.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SharedLockState {
    fn default() -> Self {
        Self::new(LockState::Locked)
    }
}
