//! Time sources.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::traits::Clock;
use crate::types::TimePoint;

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimePoint {
        TimePoint::now()
    }
}

/// Settable clock shared between clones.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<TimePoint>>,
}

impl ManualClock {
    pub fn at(now: TimePoint) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: TimePoint) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now = now.saturating_add(by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimePoint {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}
