//! Mocks that record into a shared timeline

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use bsp_core::hal::{BspError, SerialWrite};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

/// One observed hardware interaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Output pin driven high (`true`) or low
    Pin(bool),
    /// Blocking wait
    DelayMs(u32),
    /// Byte handed to the UART
    Byte(u8),
}

/// Shared, ordered event log
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Only the bytes, in send order
    pub fn bytes(&self) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Byte(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn pin(&self) -> RecordingPin {
        RecordingPin(self.clone())
    }

    pub fn delay(&self) -> RecordingDelay {
        RecordingDelay(self.clone())
    }

    pub fn serial(&self) -> RecordingSerial {
        RecordingSerial {
            log: self.clone(),
            fail_after: None,
        }
    }
}

pub struct RecordingPin(Log);

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.push(Event::Pin(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.push(Event::Pin(true));
        Ok(())
    }
}

pub struct RecordingDelay(Log);

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.push(Event::DelayMs(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.push(Event::DelayMs(ms));
    }
}

pub struct RecordingSerial {
    log: Log,
    fail_after: Option<usize>,
}

impl RecordingSerial {
    /// Accept `n` bytes, then report a UART fault on every write
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl SerialWrite for RecordingSerial {
    fn write(&mut self, byte: u8) -> nb::Result<(), BspError> {
        if let Some(remaining) = self.fail_after.as_mut() {
            if *remaining == 0 {
                return Err(nb::Error::Other(BspError::Uart));
            }
            *remaining -= 1;
        }
        self.log.push(Event::Byte(byte));
        Ok(())
    }
}
