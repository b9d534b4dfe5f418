//! Tick-counted timers
//!
//! Every scheduled behaviour in the simulation is one of these, owned by the
//! entity it belongs to. There is no global timer queue: an entity that dies
//! cancels its own timers, and dropping the entity drops them.

use serde::{Deserialize, Serialize};

use crate::ms_to_ticks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum TimerMode {
    Once,
    Repeat,
}

/// A countdown measured in simulation ticks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    remaining: u32,
    period: u32,
    mode: TimerMode,
    active: bool,
}

impl Timer {
    /// Fires once after `ticks`
    pub fn once(ticks: u32) -> Self {
        Self {
            remaining: ticks.max(1),
            period: ticks.max(1),
            mode: TimerMode::Once,
            active: true,
        }
    }

    /// Fires every `period` ticks, first after one full period
    pub fn repeating(period: u32) -> Self {
        Self {
            remaining: period.max(1),
            period: period.max(1),
            mode: TimerMode::Repeat,
            active: true,
        }
    }

    pub fn once_ms(ms: u32) -> Self {
        Self::once(ms_to_ticks(ms))
    }

    pub fn repeating_ms(ms: u32) -> Self {
        Self::repeating(ms_to_ticks(ms))
    }

    /// A timer that never fires until armed
    pub fn inactive() -> Self {
        Self {
            remaining: 0,
            period: 1,
            mode: TimerMode::Once,
            active: false,
        }
    }

    /// Same cadence, but held until `reset()` arms it
    pub fn paused(mut self) -> Self {
        self.cancel();
        self
    }

    /// Advance one tick. Returns true on the tick the timer fires.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return false;
        }
        match self.mode {
            TimerMode::Once => self.active = false,
            TimerMode::Repeat => self.remaining = self.period,
        }
        true
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.remaining = 0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> u32 {
        if self.active { self.remaining } else { 0 }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Change the cadence of a repeating timer without resetting its phase
    /// beyond the new period.
    pub fn set_period(&mut self, period: u32) {
        self.period = period.max(1);
        if self.remaining > self.period {
            self.remaining = self.period;
        }
    }

    /// Restart from a full period
    pub fn reset(&mut self) {
        self.remaining = self.period;
        self.active = true;
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::inactive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_once_fires_exactly_once() {
        let mut t = Timer::once(3);
        let fires: Vec<bool> = (0..6).map(|_| t.tick()).collect();
        assert_eq!(fires, vec![false, false, true, false, false, false]);
        assert!(!t.is_active());
    }

    #[test]
    fn test_repeating_cadence() {
        let mut t = Timer::repeating(2);
        let fired = (0..10).filter(|_| t.tick()).count();
        assert_eq!(fired, 5);
        assert!(t.is_active());
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut t = Timer::repeating(1);
        t.cancel();
        assert!((0..100).all(|_| !t.tick()));
        assert_eq!(t.remaining(), 0);
    }

    #[test]
    fn test_set_period_shortens_pending_wait() {
        let mut t = Timer::repeating(100);
        t.tick();
        t.set_period(10);
        assert_eq!(t.remaining(), 10);
        let first = (1..=10).find(|_| t.tick());
        assert_eq!(first, Some(10));
    }

    #[test]
    fn test_inactive_until_reset() {
        let mut t = Timer::inactive();
        assert!(!t.tick());
        t.set_period(2);
        t.reset();
        assert!(!t.tick());
        assert!(t.tick());
    }
}
