//! UART channel drivers
//!
//! Blocking transmit on every channel, the host-computer loopback and the
//! RS-485 half-duplex port with its direction turnaround.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::frame::{FrameAccumulator, FRAME_LEN};
use crate::hal::{ActiveLevel, BspError, Duration, SerialWrite};
use crate::irq::ReceiveHandler;
use crate::types::{BoardConfig, ChannelRole};

/// Text output on the debug channel
pub struct Console<S> {
    tx: S,
}

impl<S: SerialWrite> Console<S> {
    pub fn new(tx: S) -> Self {
        Self { tx }
    }

    /// Write a line followed by CRLF
    pub fn println(&mut self, s: &str) -> Result<(), BspError> {
        self.tx.send(s.as_bytes())?;
        self.tx.send(b"\r\n")
    }

    pub fn inner(&mut self) -> &mut S {
        &mut self.tx
    }
}

// Lets `write!`/`writeln!` target the console.
impl<S: SerialWrite> fmt::Write for Console<S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.tx.send(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

/// Host-computer link: every received byte goes straight back out
pub struct HostEcho<S> {
    tx: S,
    echoed: u32,
}

impl<S: SerialWrite> HostEcho<S> {
    pub fn new(tx: S) -> Self {
        Self { tx, echoed: 0 }
    }

    /// Bytes looped back so far
    pub fn echoed(&self) -> u32 {
        self.echoed
    }

    pub fn inner(&self) -> &S {
        &self.tx
    }
}

impl<S: SerialWrite> ReceiveHandler for HostEcho<S> {
    const ROLE: ChannelRole = ChannelRole::HostComputer;

    fn on_byte(&mut self, byte: u8) -> Result<(), BspError> {
        self.tx.send(&[byte])?;
        self.echoed = self.echoed.wrapping_add(1);
        Ok(())
    }
}

/// Half-duplex RS-485 transmitter.
///
/// The transceiver listens by default. A transmit drives the direction pin
/// to "send", waits the turnaround time, sends every byte, waits again and
/// drops back to "receive". Both waits must cover the transceiver's switch
/// time or the first/last byte collides with bus traffic.
pub struct Rs485Port<S, EN, D> {
    tx: S,
    direction: EN,
    delay: D,
    transmit_level: ActiveLevel,
    turnaround: Duration,
    frames_sent: u32,
}

impl<S, EN, D> Rs485Port<S, EN, D>
where
    S: SerialWrite,
    EN: OutputPin,
    D: DelayNs,
{
    /// Take ownership of the port and put the transceiver in receive mode.
    ///
    /// `transmit_level` is the pin level that enables the driver.
    pub fn new(
        tx: S,
        direction: EN,
        delay: D,
        transmit_level: ActiveLevel,
        config: &BoardConfig,
    ) -> Result<Self, BspError> {
        let mut port = Self {
            tx,
            direction,
            delay,
            transmit_level,
            turnaround: config.turnaround,
            frames_sent: 0,
        };
        port.receive_mode()?;
        Ok(port)
    }

    fn transmit_mode(&mut self) -> Result<(), BspError> {
        self.transmit_level.drive(&mut self.direction, true)
    }

    fn receive_mode(&mut self) -> Result<(), BspError> {
        self.transmit_level.drive(&mut self.direction, false)
    }

    /// Send `bytes` with the full direction turnaround around them
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), BspError> {
        self.transmit_mode()?;
        self.delay.delay_ms(self.turnaround.as_millis());

        // Give the bus back even if the UART failed mid-frame.
        let sent = self.tx.send(bytes);

        self.delay.delay_ms(self.turnaround.as_millis());
        self.receive_mode()?;
        sent
    }

    /// Echo a complete frame back onto the bus, if one has arrived.
    ///
    /// Returns whether a frame was sent.
    pub fn echo_frame(&mut self, rx: &mut FrameAccumulator) -> Result<bool, BspError> {
        match rx.take_frame() {
            Some(frame) => self.echo(&frame).map(|_| true),
            None => Ok(false),
        }
    }

    /// Send a frame already taken from the receive buffer
    pub fn echo(&mut self, frame: &[u8; FRAME_LEN]) -> Result<(), BspError> {
        self.send(frame)?;
        self.frames_sent = self.frames_sent.wrapping_add(1);
        #[cfg(feature = "defmt")]
        defmt::debug!("RS-485 frame echoed: {:x}", frame);
        Ok(())
    }

    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    pub fn release(self) -> (S, EN, D) {
        (self.tx, self.direction, self.delay)
    }
}
