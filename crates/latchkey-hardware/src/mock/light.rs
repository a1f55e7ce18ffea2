//! Mock indicator light for testing and development.

use crate::{Result, traits::ColorLight, types::Rgb};
use std::sync::{Arc, Mutex};

/// Mock RGB light that records every color shown.
#[derive(Debug)]
pub struct MockColorLight {
    shown: Arc<Mutex<Vec<Rgb>>>,
}

impl MockColorLight {
    /// Create a mock light and its inspection handle.
    pub fn new() -> (Self, MockColorLightHandle) {
        let shown = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                shown: Arc::clone(&shown),
            },
            MockColorLightHandle { shown },
        )
    }
}

impl ColorLight for MockColorLight {
    async fn set_color(&mut self, color: Rgb) -> Result<()> {
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(color);
        Ok(())
    }

    async fn off(&mut self) -> Result<()> {
        self.set_color(Rgb::OFF).await
    }
}

/// Inspection handle for a [`MockColorLight`].
#[derive(Debug, Clone)]
pub struct MockColorLightHandle {
    shown: Arc<Mutex<Vec<Rgb>>>,
}

impl MockColorLightHandle {
    /// Every color shown so far, in order. `off` records as all zeros.
    #[must_use]
    pub fn shown(&self) -> Vec<Rgb> {
        self.shown.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The color currently showing, if any was ever set.
    #[must_use]
    pub fn current(&self) -> Option<Rgb> {
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .copied()
    }
}
