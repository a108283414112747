#![cfg_attr(not(feature = "std"), no_std)]

//! # BSP Core
//!
//! Board logic for the N32G435 motor-controller board: key debounce,
//! factory-test commands on the debug console, the host-computer loopback
//! and the RS-485 fixed-frame echo. Hardware access goes through the traits
//! in [`hal`] so everything here runs on the host under test.

#[cfg(all(test, not(feature = "std")))]
extern crate std;

pub mod types;
pub mod hal;
pub mod tick;
pub mod key;
pub mod command;
pub mod frame;
pub mod irq;
pub mod uart;
pub mod timer;
pub mod led;


pub use types::*;
pub use hal::{ActiveLevel, BspError, Duration, Instant, SerialWrite, TickSource, UartIrqSource, UartStatus};
pub use tick::{TickCounter, TickDelay};
pub use key::{Key, KeyEvent, KeyScanner};
pub use command::{CommandParser, FactoryFlags};
pub use frame::{FrameAccumulator, FRAME_LEN};
pub use irq::ReceiveHandler;
pub use uart::{Console, HostEcho, Rs485Port};
pub use timer::TestSignal;
pub use led::Leds;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Board configuration used by the firmware: 10 ms debounce, 115200 baud,
/// 1 ms RS-485 turnaround
pub fn default_config() -> BoardConfig {
    BoardConfig::default()
}
