//! Mock GPIO pins for testing and development.

use crate::{
    Result,
    traits::{InputPin, OutputPin},
    types::Level,
};
use std::sync::{Arc, Mutex};

/// Mock output pin that records every level written to it.
///
/// The write timeline lets tests assert pulse shapes, for example that a
/// momentary actuation wrote the unlock level and then restored the lock
/// level.
#[derive(Debug)]
pub struct MockOutputPin {
    writes: Arc<Mutex<Vec<Level>>>,
    level: Level,
}

impl MockOutputPin {
    /// Create a mock pin starting at `initial` and its inspection handle.
    ///
    /// The initial level is not recorded in the write timeline; only
    /// explicit `set_level` calls are.
    pub fn new(initial: Level) -> (Self, MockOutputPinHandle) {
        let writes = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                writes: Arc::clone(&writes),
                level: initial,
            },
            MockOutputPinHandle { writes },
        )
    }
}

impl OutputPin for MockOutputPin {
    fn set_level(&mut self, level: Level) -> Result<()> {
        self.level = level;
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(level);
        Ok(())
    }

    fn level(&self) -> Level {
        self.level
    }
}

/// Inspection handle for a [`MockOutputPin`].
#[derive(Debug, Clone)]
pub struct MockOutputPinHandle {
    writes: Arc<Mutex<Vec<Level>>>,
}

impl MockOutputPinHandle {
    /// Every level written so far, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<Level> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The most recent write, if any.
    #[must_use]
    pub fn last_write(&self) -> Option<Level> {
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .copied()
    }

    /// Forget the recorded timeline.
    pub fn clear(&self) {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Mock input pin whose level a test sets through its handle.
#[derive(Debug)]
pub struct MockInputPin {
    level: Arc<Mutex<Level>>,
}

impl MockInputPin {
    /// Create a mock input pin reading `initial` and its control handle.
    pub fn new(initial: Level) -> (Self, MockInputPinHandle) {
        let level = Arc::new(Mutex::new(initial));
        (
            Self {
                level: Arc::clone(&level),
            },
            MockInputPinHandle { level },
        )
    }
}

impl InputPin for MockInputPin {
    fn read_level(&self) -> Result<Level> {
        Ok(*self.level.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Control handle for a [`MockInputPin`].
#[derive(Debug, Clone)]
pub struct MockInputPinHandle {
    level: Arc<Mutex<Level>>,
}

impl MockInputPinHandle {
    /// Drive the simulated pin to `level`.
    pub fn set_level(&self, level: Level) {
        *self.level.lock().unwrap_or_else(|e| e.into_inner()) = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_pin_timeline() {
        let (mut pin, handle) = MockOutputPin::new(Level::Low);
        assert_eq!(pin.level(), Level::Low);
        assert!(handle.writes().is_empty());

        pin.set_level(Level::High).unwrap();
        pin.set_level(Level::Low).unwrap();

        assert_eq!(pin.level(), Level::Low);
        assert_eq!(handle.writes(), vec![Level::High, Level::Low]);
        assert_eq!(handle.last_write(), Some(Level::Low));
    }

    #[test]
    fn test_input_pin_follows_handle() {
        let (pin, handle) = MockInputPin::new(Level::High);
        assert_eq!(pin.read_level().unwrap(), Level::High);

        handle.set_level(Level::Low);
        assert_eq!(pin.read_level().unwrap(), Level::Low);
    }
}
