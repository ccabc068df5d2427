//! Test pacer — completes every pause immediately.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use treasure_core::time::Pacer;

/// A pacer that never waits and records every requested delay.
#[derive(Debug, Default)]
pub struct InstantPacer {
    delays: Mutex<Vec<Duration>>,
}

impl InstantPacer {
    /// Creates a pacer with no recorded delays.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the delays requested so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pacer for InstantPacer {
    async fn pace(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}
