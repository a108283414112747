//! Hardware Abstraction Layer for the board support logic
//!
//! Everything the core needs from the chip goes through the traits here:
//! a millisecond tick, byte-level UART transmit and receive status, and
//! GPIO via `embedded-hal`. Delays use `embedded_hal::delay::DelayNs`.

use embedded_hal::digital::{InputPin, OutputPin};

/// Millisecond timestamp from the free-running tick counter.
///
/// The counter is 32 bits wide and wraps; all arithmetic is wrapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(u32);

impl Instant {
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    pub const fn as_millis(&self) -> u32 {
        self.0
    }

    /// Time elapsed since `earlier`, correct across one counter wrap.
    pub const fn duration_since(&self, earlier: Instant) -> Duration {
        Duration(self.0.wrapping_sub(earlier.0))
    }

    pub const fn wrapping_add(&self, d: Duration) -> Instant {
        Instant(self.0.wrapping_add(d.0))
    }
}

/// Millisecond duration
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Duration(u32);

impl Duration {
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    pub const fn as_millis(&self) -> u32 {
        self.0
    }
}

/// Source of the monotonic millisecond tick
pub trait TickSource {
    /// Current tick count
    fn now(&self) -> Instant;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Error types for board operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BspError {
    /// GPIO operation failed
    Gpio,
    /// UART operation failed
    Uart,
    /// Invalid configuration
    InvalidConfig,
    /// A fixed-capacity receive buffer filled up; the pending data was dropped
    BufferFull,
}

impl core::fmt::Display for BspError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BspError::Gpio => write!(f, "GPIO operation failed"),
            BspError::Uart => write!(f, "UART operation failed"),
            BspError::InvalidConfig => write!(f, "Invalid configuration"),
            BspError::BufferFull => write!(f, "Receive buffer full, data dropped"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BspError {}

/// Transmit side of a UART
pub trait SerialWrite {
    /// Start sending one byte. `WouldBlock` while the transmit register is busy.
    fn write(&mut self, byte: u8) -> nb::Result<(), BspError>;

    /// Send every byte, spinning on transmit-ready after each one.
    fn send(&mut self, bytes: &[u8]) -> Result<(), BspError> {
        for &b in bytes {
            nb::block!(self.write(b))?;
        }
        Ok(())
    }
}

impl<S: SerialWrite + ?Sized> SerialWrite for &mut S {
    fn write(&mut self, byte: u8) -> nb::Result<(), BspError> {
        (**self).write(byte)
    }
}

/// Interrupt status of a UART, sampled once per vector entry
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartStatus {
    /// Receive data register not empty
    pub rx_ready: bool,
    /// Transmit data register empty
    pub tx_empty: bool,
    /// Receive overrun
    pub overrun: bool,
}

/// Receive-interrupt side of a UART
pub trait UartIrqSource {
    /// Pending interrupt conditions
    fn status(&mut self) -> UartStatus;

    /// Read the receive data register
    fn read_data(&mut self) -> u8;

    /// Clear the overrun flag. On this UART family that is a status read
    /// followed by a data read, both values discarded.
    fn clear_overrun(&mut self);
}

/// Electrical level that means "active" for a pin
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    High,
    Low,
}

impl ActiveLevel {
    /// Read `pin` and report whether it is at this level
    pub fn is_active<P: InputPin>(&self, pin: &mut P) -> Result<bool, BspError> {
        match self {
            ActiveLevel::High => pin.is_high(),
            ActiveLevel::Low => pin.is_low(),
        }
        .map_err(|_| BspError::Gpio)
    }

    /// Drive `pin` to this level (`active`) or the opposite one
    pub fn drive<P: OutputPin>(&self, pin: &mut P, active: bool) -> Result<(), BspError> {
        let high = match self {
            ActiveLevel::High => active,
            ActiveLevel::Low => !active,
        };
        if high {
            pin.set_high().map_err(|_| BspError::Gpio)
        } else {
            pin.set_low().map_err(|_| BspError::Gpio)
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::delay::DelayNs;
    use embedded_hal::digital::ErrorType;
    use heapless::Vec;

    /// Hand-driven tick source
    #[derive(Default)]
    pub struct MockClock {
        now: Cell<u32>,
    }

    impl MockClock {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn starting_at(ms: u32) -> Self {
            Self { now: Cell::new(ms) }
        }

        pub fn advance(&self, ms: u32) {
            self.now.set(self.now.get().wrapping_add(ms));
        }

        pub fn set(&self, ms: u32) {
            self.now.set(ms);
        }
    }

    impl TickSource for MockClock {
        fn now(&self) -> Instant {
            Instant::from_millis(self.now.get())
        }
    }

    /// Input pin whose level is shared with the test through a `Cell`
    pub struct MockInput<'a> {
        high: &'a Cell<bool>,
    }

    impl<'a> MockInput<'a> {
        pub fn new(high: &'a Cell<bool>) -> Self {
            Self { high }
        }
    }

    impl ErrorType for MockInput<'_> {
        type Error = Infallible;
    }

    impl InputPin for MockInput<'_> {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.high.get())
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.high.get())
        }
    }

    /// Output pin recording every level it was driven to
    #[derive(Default)]
    pub struct MockOutput {
        history: Vec<bool, 32>,
    }

    impl MockOutput {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn history(&self) -> &[bool] {
            &self.history
        }

        pub fn is_high(&self) -> bool {
            self.history.last().copied().unwrap_or(false)
        }
    }

    impl ErrorType for MockOutput {
        type Error = Infallible;
    }

    impl OutputPin for MockOutput {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            let _ = self.history.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            let _ = self.history.push(true);
            Ok(())
        }
    }

    /// Transmitter that records bytes and reports busy once before each byte
    #[derive(Default)]
    pub struct MockSerial {
        sent: Vec<u8, 1024>,
        busy: bool,
        busy_polls: usize,
    }

    impl MockSerial {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> &[u8] {
            &self.sent
        }

        pub fn clear(&mut self) {
            self.sent.clear();
        }

        /// Number of times `write` reported `WouldBlock`
        pub fn busy_polls(&self) -> usize {
            self.busy_polls
        }
    }

    impl SerialWrite for MockSerial {
        fn write(&mut self, byte: u8) -> nb::Result<(), BspError> {
            if !self.busy {
                self.busy = true;
                self.busy_polls += 1;
                return Err(nb::Error::WouldBlock);
            }
            self.busy = false;
            self.sent.push(byte).map_err(|_| nb::Error::Other(BspError::Uart))
        }
    }

    /// UART receive side fed from a script of bytes
    #[derive(Default)]
    pub struct MockUart {
        rx: heapless::Deque<u8, 64>,
        overrun: bool,
        tx_empty: bool,
        overrun_clears: usize,
    }

    impl MockUart {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn receive(&mut self, byte: u8) {
            let _ = self.rx.push_back(byte);
        }

        pub fn raise_overrun(&mut self) {
            self.overrun = true;
        }

        pub fn set_tx_empty(&mut self, empty: bool) {
            self.tx_empty = empty;
        }

        pub fn overrun_clears(&self) -> usize {
            self.overrun_clears
        }
    }

    impl UartIrqSource for MockUart {
        fn status(&mut self) -> UartStatus {
            UartStatus {
                rx_ready: !self.rx.is_empty(),
                tx_empty: self.tx_empty,
                overrun: self.overrun,
            }
        }

        fn read_data(&mut self) -> u8 {
            self.rx.pop_front().unwrap_or(0)
        }

        fn clear_overrun(&mut self) {
            self.overrun = false;
            self.overrun_clears += 1;
        }
    }

    /// Delay that only records what it was asked to wait
    #[derive(Default)]
    pub struct MockDelay {
        waits_ns: Vec<u32, 16>,
    }

    impl MockDelay {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn waits_ms(&self) -> impl Iterator<Item = u32> + '_ {
            self.waits_ns.iter().map(|ns| ns / 1_000_000)
        }

        pub fn count(&self) -> usize {
            self.waits_ns.len()
        }
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            let _ = self.waits_ns.push(ns);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.delay_ns(ms.saturating_mul(1_000_000));
        }
    }
}
