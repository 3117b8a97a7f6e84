//! Keeping ticks steady.

use std::time::Duration;

#[cfg(test)]
use mock_instant::Instant;
#[cfg(not(test))]
use std::time::Instant;

/// Keeps track of time between relatively steady pulses.
///
/// Ticks try to stay lined up with the first tick, but if [`Self::tick`] is called more than half a period
/// late, the next tick will be reset relative to the current time instead. If called early it will always advance
/// by exactly one tick.
#[derive(Debug)]
pub struct Timer {
    next: Instant,
    period: Duration,
}

impl Timer {
    /// Create a new timer with the given period. The first tick is right now.
    pub fn new(period: Duration) -> Self {
        Self {
            next: Instant::now(),
            period,
        }
    }

    /// How much time is left before the timer ticks over. Minimum zero.
    pub fn remaining(&self) -> Duration {
        self.next
            .checked_duration_since(Instant::now())
            .unwrap_or(Duration::ZERO)
    }

    /// Move on to the next tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        if now < self.next + self.period / 2 {
            self.next += self.period;
        } else {
            self.next = now + self.period;
        }
    }

    /// Check whether the tick is due; if so, move on to the next one.
    pub fn ready(&mut self) -> bool {
        if Instant::now() >= self.next {
            self.tick();
            true
        } else {
            false
        }
    }
}
