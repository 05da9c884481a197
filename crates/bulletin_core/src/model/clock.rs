//! Time sources and announcement id assignment.

use crate::model::announcement::AnnouncementId;
use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond wall-clock source.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// Manually driven clock for deterministic callers.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: Cell::new(start_millis),
        }
    }

    pub fn set(&self, millis: u64) {
        self.now.set(millis);
    }

    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get().saturating_add(millis));
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

/// Issues strictly increasing epoch-millis ids.
///
/// Two calls within the same clock tick, or after the clock stepped
/// backwards, still receive distinct ids: `next = max(now, last + 1)`.
#[derive(Debug)]
pub struct IdGenerator<C: Clock> {
    clock: C,
    last_issued: Option<u64>,
}

impl<C: Clock> IdGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last_issued: None,
        }
    }

    /// Raises the floor so future ids sort after `millis`.
    pub fn observe(&mut self, millis: u64) {
        self.last_issued = Some(self.last_issued.map_or(millis, |last| last.max(millis)));
    }

    /// Returns `(id, issued_at_millis)`.
    pub fn next_id(&mut self) -> (AnnouncementId, u64) {
        let now = self.clock.now_millis();
        let issued = match self.last_issued {
            Some(last) if last >= now => last.saturating_add(1),
            _ => now,
        };
        self.last_issued = Some(issued);
        (AnnouncementId::from_millis(issued), now)
    }
}
