//! Wall-clock source in the character's timezone.

use crate::time::TimeOfDay;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn timezone(&self) -> Tz;

    fn local_now(&self) -> DateTime<Tz> {
        self.now().with_timezone(&self.timezone())
    }

    /// Time-of-day bucket for the current local time.
    fn bucket(&self) -> TimeOfDay {
        TimeOfDay::classify(&self.local_now())
    }
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Jakarta)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    tz: Tz,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>, tz: Tz) -> Self {
        Self {
            now: Mutex::new(start),
            tz,
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid instant.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}
