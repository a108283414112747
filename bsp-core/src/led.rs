//! Status LEDs

use embedded_hal::digital::OutputPin;

use crate::hal::BspError;
use crate::types::LedId;

/// The three status LEDs, active high
pub struct Leds<P> {
    pins: [P; 3],
}

impl<P: OutputPin> Leds<P> {
    /// Pins in `LedId` order
    pub fn new(pins: [P; 3]) -> Self {
        Self { pins }
    }

    pub fn set(&mut self, led: LedId, on: bool) -> Result<(), BspError> {
        let pin = &mut self.pins[led as usize];
        if on {
            pin.set_high().map_err(|_| BspError::Gpio)
        } else {
            pin.set_low().map_err(|_| BspError::Gpio)
        }
    }

    pub fn set_all(&mut self, on: bool) -> Result<(), BspError> {
        for led in LedId::ALL {
            self.set(led, on)?;
        }
        Ok(())
    }
}
