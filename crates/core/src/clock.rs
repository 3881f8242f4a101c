//! Injectable time source.
//!
//! The reminder engine reads two things from the clock: the UTC instant
//! (for `created_at` stamps and the ledger's day window) and the local
//! wall-clock reading (for comparing against plan dates and HH:MM times,
//! which carry no timezone). Production uses [`SystemClock`]; tests pin
//! both readings with `FixedClock`, available to other crates through the
//! `test-util` feature.

#[cfg(any(test, feature = "test-util"))]
use std::sync::Mutex;

#[cfg(any(test, feature = "test-util"))]
use chrono::Duration;
use chrono::{Local, NaiveDateTime, Utc};

use crate::types::Timestamp;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current UTC instant.
    fn now(&self) -> Timestamp;

    /// Current local wall-clock reading.
    fn local_now(&self) -> NaiveDateTime;
}

/// The operating system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A manually driven clock whose local timezone is UTC.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug)]
pub struct FixedClock {
    local: Mutex<NaiveDateTime>,
}

#[cfg(any(test, feature = "test-util"))]
impl FixedClock {
    /// Pin the clock at the given wall-clock reading.
    pub fn at(local: NaiveDateTime) -> Self {
        Self {
            local: Mutex::new(local),
        }
    }

    /// Pin the clock at `date` (`YYYY-MM-DD`) and `time` (`HH:MM`).
    ///
    /// Panics on malformed input; intended for tests and fixtures.
    pub fn at_str(date: &str, time: &str) -> Self {
        let local = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M")
            .unwrap_or_else(|e| panic!("invalid fixed clock reading '{date} {time}': {e}"));
        Self::at(local)
    }

    /// Move the clock to a new reading.
    pub fn set(&self, local: NaiveDateTime) {
        *self.lock() = local;
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.lock();
        *guard += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        // A poisoned fixed clock still holds a valid reading.
        self.local.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.lock().and_utc()
    }

    fn local_now(&self) -> NaiveDateTime {
        *self.lock()
    }
}
