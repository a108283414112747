//! Core data types for the board

use crate::hal::{Duration, Instant};

/// Physical buttons on the board
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Hash))]
pub enum KeyId {
    /// Start/stop button (PC6)
    StartStop,
    /// Direction button (PC7)
    CwCcw,
}

impl KeyId {
    /// Name used in console output
    pub const fn label(&self) -> &'static str {
        match self {
            KeyId::StartStop => "Start/Stop Key",
            KeyId::CwCcw => "CW/CCW Key",
        }
    }
}

/// Debounce state of one key
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerState {
    /// Released, waiting for the first DOWN sample
    #[default]
    Idle,
    /// DOWN seen at the given tick, waiting out the settle window
    PendingConfirm(Instant),
    /// Settle window done, waiting for release
    Confirmed,
}

impl TriggerState {
    /// Tick at which the pending press began, if pending
    pub const fn pending_since(&self) -> Option<Instant> {
        match self {
            TriggerState::PendingConfirm(since) => Some(*since),
            TriggerState::Idle | TriggerState::Confirmed => None,
        }
    }
}

/// The three UART roles on the board
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelRole {
    /// Debug console (UART4), factory commands in, log text out
    Debug,
    /// Host computer link (UART5), byte loopback
    HostComputer,
    /// RS-485 bus (USART3), fixed-frame echo
    Rs485,
}

/// Factory functional tests that can be flagged from the debug console
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Hash))]
pub enum FactoryTest {
    Can,
    Rs485,
    PcCom,
    Current,
    Voltage,
    Overflow,
    Temperature,
}

impl FactoryTest {
    /// Match order used by the command parser
    pub const ALL: [FactoryTest; 7] = [
        FactoryTest::Can,
        FactoryTest::Rs485,
        FactoryTest::PcCom,
        FactoryTest::Current,
        FactoryTest::Voltage,
        FactoryTest::Overflow,
        FactoryTest::Temperature,
    ];

    /// Command keyword as sent by the test fixture.
    ///
    /// `TEMPERATUR` is kept without the trailing `E`. A `TEMPERATURE` line
    /// still matches because lines are matched by prefix.
    pub const fn keyword(&self) -> &'static [u8] {
        match self {
            FactoryTest::Can => b"CAN",
            FactoryTest::Rs485 => b"RS485",
            FactoryTest::PcCom => b"PC_COM",
            FactoryTest::Current => b"CURRENT",
            FactoryTest::Voltage => b"VOLTAGE",
            FactoryTest::Overflow => b"OVERFLOW",
            FactoryTest::Temperature => b"TEMPERATUR",
        }
    }

    pub const fn index(&self) -> usize {
        *self as usize
    }
}

/// Status LEDs
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedId {
    /// PC15
    Led1,
    /// PC14
    Led2,
    /// PC13
    Led3,
}

impl LedId {
    pub const ALL: [LedId; 3] = [LedId::Led1, LedId::Led2, LedId::Led3];
}

/// Board configuration parameters
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    /// Key settle window
    pub debounce: Duration,
    /// Baud rate shared by all three UARTs
    pub baud_rate: u32,
    /// RS-485 transceiver switch time, waited before and after each transmit
    pub turnaround: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(10),
            baud_rate: 115_200,
            turnaround: Duration::from_millis(1),
        }
    }
}

impl BoardConfig {
    /// Create a new configuration with validation
    pub fn new(debounce_ms: u32, baud_rate: u32, turnaround_ms: u32) -> Result<Self, &'static str> {
        if debounce_ms == 0 || debounce_ms > 100 {
            return Err("Debounce must be between 1 and 100ms");
        }
        if !(1_200..=4_000_000).contains(&baud_rate) {
            return Err("Baud rate must be between 1200 and 4000000");
        }
        if turnaround_ms == 0 || turnaround_ms > 10 {
            return Err("RS-485 turnaround must be between 1 and 10ms");
        }

        Ok(Self {
            debounce: Duration::from_millis(debounce_ms),
            baud_rate,
            turnaround: Duration::from_millis(turnaround_ms),
        })
    }
}
