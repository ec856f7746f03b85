//! Clock abstraction for token expiry
//!
//! The token manager reads the current time through `Clock` so expiry can be
//! driven deterministically in tests.

use chrono::{DateTime, Utc};

/// Trait for getting the current time
pub trait Clock: Send + Sync {
    /// Returns the current time
    fn now(&self) -> DateTime<Utc>;
}

/// System clock that returns the actual current time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for testing
#[cfg(test)]
#[derive(Debug)]
pub struct FixedClock(std::sync::RwLock<DateTime<Utc>>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.read().unwrap()
    }
}

#[cfg(test)]
impl FixedClock {
    /// Creates a new fixed clock at the given time
    pub fn new(time: DateTime<Utc>) -> Self {
        Self(std::sync::RwLock::new(time))
    }

    /// Moves the clock forward
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.0.write().unwrap();
        *now += by;
    }
}
