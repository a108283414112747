//! Millisecond tick counter and busy-wait delay

use embedded_hal::delay::DelayNs;
use portable_atomic::{AtomicU32, Ordering};

use crate::hal::{Instant, TickSource};

/// Longest wait [`TickCounter::delay_ms`] honours. The wrapping elapsed
/// count tops out at `u32::MAX`, so a longer wait could never finish.
pub const MAX_DELAY_MS: u32 = u32::MAX - 1;

/// Free-running millisecond counter
pub struct TickCounter {
    ticks: AtomicU32,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advance by one tick (called from the SysTick interrupt)
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Spin until more than `ms` ticks have passed.
    ///
    /// Waiting for the counter to move past the target means the delay is
    /// never shorter than `ms` even when started just before a tick. Zero
    /// returns at once; anything above [`MAX_DELAY_MS`] is clamped to it.
    pub fn delay_ms(&self, ms: u32) {
        self.wait_since(self.now(), ms);
    }

    fn wait_since(&self, start: Instant, ms: u32) {
        if ms == 0 {
            return;
        }
        let ms = ms.min(MAX_DELAY_MS);
        while self.now().duration_since(start).as_millis() <= ms {
            core::hint::spin_loop();
        }
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for TickCounter {
    fn now(&self) -> Instant {
        Instant::from_millis(self.ticks.load(Ordering::Relaxed))
    }
}

/// `DelayNs` backed by a [`TickCounter`], millisecond resolution
pub struct TickDelay<'a> {
    counter: &'a TickCounter,
}

impl<'a> TickDelay<'a> {
    pub fn new(counter: &'a TickCounter) -> Self {
        Self { counter }
    }
}

impl DelayNs for TickDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.counter.delay_ms(ns.div_ceil(1_000_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.counter.delay_ms(us.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.counter.delay_ms(ms);
    }
}
