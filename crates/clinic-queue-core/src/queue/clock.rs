//! Wall-clock source for "today" and time stamps.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, NaiveDate};

/// Format of `time_in` / `time_out` stamps.
pub const STAMP_FORMAT: &str = "%H:%M:%S";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Local wall-clock stamp, e.g. `"09:15:00"`.
    fn stamp(&self) -> String {
        self.now().format(STAMP_FORMAT).to_string()
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        match self.now.lock() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    pub fn advance(&self, by: Duration) {
        let next = self.now() + by;
        self.set(next);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
