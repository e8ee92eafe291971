//! Software time-of-day clock.
//!
//! There is no real hardware counter behind this: [`machine::Machine`]
//! advances it by calling [`tick`] once per simulated clock unit, advancing
//! a monotonic counter rather than reading a free-running register directly.

use core::sync::atomic::{AtomicU64, Ordering};

static TOD_US: AtomicU64 = AtomicU64::new(0);

/// Current time-of-day in microseconds since boot.
pub fn now_us() -> u64 {
    TOD_US.load(Ordering::Relaxed)
}

/// Advance the clock. Called by the machine's interval-timer source.
pub fn tick(delta_us: u64) {
    TOD_US.fetch_add(delta_us, Ordering::Relaxed);
}

/// Reset to zero. Test-only: production boot never rewinds the clock.
#[cfg(test)]
pub fn reset_for_test() {
    TOD_US.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_monotonically() {
        reset_for_test();
        assert_eq!(now_us(), 0);
        tick(1000);
        tick(500);
        assert_eq!(now_us(), 1500);
    }
}
