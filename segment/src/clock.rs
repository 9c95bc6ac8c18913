use std::cell::Cell;
use std::rc::Rc;
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source for the uptime policies.
pub trait Clock {
    /// Nanoseconds since an arbitrary, fixed epoch.
    fn now_ns(&self) -> i64;

    fn sleep(&self, duration: Duration);

    fn now_us(&self) -> i64 {
        self.now_ns() / 1_000
    }
}

/// Process uptime backed by [`Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

fn epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> i64 {
        i64::try_from(epoch().elapsed().as_nanos()).unwrap_or(i64::MAX)
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Hand-driven clock. Sleeping advances it instantly, which makes paced replays deterministic.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ns: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new(now_ns: i64) -> Self {
        Self {
            now_ns: Rc::new(Cell::new(now_ns)),
        }
    }

    pub fn set_ns(&self, now_ns: i64) {
        self.now_ns.set(now_ns);
    }

    pub fn advance(&self, duration: Duration) {
        let step = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        self.now_ns.set(self.now_ns.get().saturating_add(step));
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> i64 {
        self.now_ns.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_moves_forward() {
        let clock = MonotonicClock;
        let before = clock.now_ns();
        clock.sleep(Duration::from_millis(2));

        assert!(clock.now_ns() - before >= 2_000_000);
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();

        handle.sleep(Duration::from_micros(3));
        assert_eq!(clock.now_ns(), 4_000);
        assert_eq!(clock.now_us(), 4);

        clock.set_ns(10);
        assert_eq!(handle.now_ns(), 10);
    }
}
