//! Testability port for injecting time.

use chrono::{DateTime, Utc};

/// Wall clock used for watch timers and cache staleness.
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
