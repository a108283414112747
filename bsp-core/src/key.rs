//! Debounced key scanning
//!
//! Each key runs a three-state machine driven by periodic `scan` calls:
//! a DOWN sample arms the key, and once the settle window has elapsed a
//! single re-sample decides whether the press was real. Taps shorter than
//! the window are rejected.

use core::fmt;

use embedded_hal::digital::InputPin;
use heapless::Vec;

use crate::hal::{ActiveLevel, BspError, Duration, Instant, TickSource};
use crate::types::{BoardConfig, KeyId, TriggerState};

/// A confirmed key press
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub key: KeyId,
    /// Press counter after this press
    pub count: u32,
    /// Tick of the confirming sample
    pub at: Instant,
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Down", self.key.label())
    }
}

/// One debounced key bound to an input pin
pub struct Key<P> {
    id: KeyId,
    pin: P,
    active: ActiveLevel,
    down: bool,
    state: TriggerState,
    pressed: bool,
    press_count: u32,
}

impl<P> Key<P>
where
    P: InputPin,
{
    pub fn new(id: KeyId, pin: P, active: ActiveLevel) -> Self {
        Self {
            id,
            pin,
            active,
            down: false,
            state: TriggerState::Idle,
            pressed: false,
            press_count: 0,
        }
    }

    fn sample(&mut self) -> Result<bool, BspError> {
        self.down = self.active.is_active(&mut self.pin)?;
        Ok(self.down)
    }

    /// Advance the state machine by one scan
    pub fn update(&mut self, now: Instant, window: Duration) -> Result<Option<KeyEvent>, BspError> {
        let mut down = self.sample()?;
        let mut event = None;

        if self.state == TriggerState::Idle && down {
            self.state = TriggerState::PendingConfirm(now);
        }

        if let TriggerState::PendingConfirm(since) = self.state {
            if now.duration_since(since) >= window {
                down = self.sample()?;
                if down {
                    self.pressed = true;
                    self.press_count = self.press_count.wrapping_add(1);
                    event = Some(KeyEvent {
                        key: self.id,
                        count: self.press_count,
                        at: now,
                    });
                }
                self.state = TriggerState::Confirmed;
            }
        }

        // The confirming re-sample counts: a key already released at that
        // point goes straight back to Idle.
        if self.state == TriggerState::Confirmed && !down {
            self.state = TriggerState::Idle;
        }

        Ok(event)
    }
}

impl<P> Key<P> {
    pub fn id(&self) -> KeyId {
        self.id
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Raw level of the most recent sample (true = DOWN)
    pub fn is_down(&self) -> bool {
        self.down
    }

    pub fn press_count(&self) -> u32 {
        self.press_count
    }

    /// Whether a press has been latched since the last `take_pressed`
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Read and clear the press latch
    pub fn take_pressed(&mut self) -> bool {
        core::mem::replace(&mut self.pressed, false)
    }
}

/// Fixed set of keys scanned together
pub struct KeyScanner<P, const N: usize> {
    keys: [Key<P>; N],
    window: Duration,
}

impl<P, const N: usize> KeyScanner<P, N>
where
    P: InputPin,
{
    /// Build the scanner from `(key, pin)` bindings.
    ///
    /// Each key identity may appear once; duplicates are `InvalidConfig`.
    pub fn new(
        bindings: [(KeyId, P); N],
        active: ActiveLevel,
        config: &BoardConfig,
    ) -> Result<Self, BspError> {
        for i in 0..N {
            for j in (i + 1)..N {
                if bindings[i].0 == bindings[j].0 {
                    return Err(BspError::InvalidConfig);
                }
            }
        }

        Ok(Self {
            keys: bindings.map(|(id, pin)| Key::new(id, pin, active)),
            window: config.debounce,
        })
    }

    /// Sample every key once and return the presses confirmed by this scan
    pub fn scan<T: TickSource>(&mut self, clock: &T) -> Result<Vec<KeyEvent, N>, BspError> {
        let now = clock.now();
        let mut events = Vec::new();

        for key in self.keys.iter_mut() {
            if let Some(event) = key.update(now, self.window)? {
                #[cfg(feature = "defmt")]
                defmt::info!("{} Down (#{})", event.key.label(), event.count);

                // Capacity equals the key count, so this cannot fail.
                let _ = events.push(event);
            }
        }

        Ok(events)
    }
}

impl<P, const N: usize> KeyScanner<P, N> {
    pub fn key(&self, id: KeyId) -> Option<&Key<P>> {
        self.keys.iter().find(|k| k.id == id)
    }

    pub fn key_mut(&mut self, id: KeyId) -> Option<&mut Key<P>> {
        self.keys.iter_mut().find(|k| k.id == id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key<P>> {
        self.keys.iter()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
