//! Injected time source

use time::OffsetDateTime;

/// Time source injected into the scheduler so tests can control the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock implementation used by the host application.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
