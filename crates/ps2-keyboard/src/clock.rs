use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of capture timestamps for dispatched key events.
pub trait Clock {
    /// Monotonic nanoseconds since an arbitrary origin.
    fn now_ns(&self) -> u64;
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Manually driven clock. Clones share the same time, so a test can keep a
/// handle after giving one to a session.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<u64>>,
}

impl FakeClock {
    pub fn new(start_ns: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ns)),
        }
    }

    pub fn set(&self, ns: u64) {
        self.now.set(ns);
    }

    pub fn advance(&self, delta_ns: u64) {
        self.now.set(self.now.get().saturating_add(delta_ns));
    }
}

impl Clock for FakeClock {
    fn now_ns(&self) -> u64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_clones_share_time() {
        let clock = FakeClock::new(10);
        let handle = clock.clone();
        handle.advance(5);
        assert_eq!(clock.now_ns(), 15);
        clock.set(100);
        assert_eq!(handle.now_ns(), 100);
    }

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(b >= a);
    }
}
