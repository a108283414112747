//! Time-base timer test signal

use embedded_hal::digital::OutputPin;

use crate::hal::BspError;

/// Square wave on a test pin, toggled from the timer update interrupt.
///
/// Even update counts drive the pin high, odd counts drive it low, so a
/// 1 kHz update rate gives a 500 Hz signal for probing the time base.
pub struct TestSignal<P> {
    pin: P,
    updates: u32,
}

impl<P: OutputPin> TestSignal<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, updates: 0 }
    }

    /// Handle one timer update event
    pub fn on_update(&mut self) -> Result<(), BspError> {
        self.updates = self.updates.wrapping_add(1);
        if self.updates % 2 == 0 {
            self.pin.set_high().map_err(|_| BspError::Gpio)
        } else {
            self.pin.set_low().map_err(|_| BspError::Gpio)
        }
    }

    pub fn updates(&self) -> u32 {
        self.updates
    }

    pub fn release(self) -> P {
        self.pin
    }
}
