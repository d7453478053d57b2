//! Wall-clock time source. Tests use `test_fixtures::ManualClock` instead.

use chrono::{DateTime, Utc};

use crate::infrastructure::ports::ClockPort;

/// Reads `Utc::now()` on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
