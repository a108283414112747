//! Factory-test command recognizer for the debug console
//!
//! The test fixture sends one ASCII keyword per line (`\n` terminated).
//! A recognized line latches the matching flag; nothing is sent back.

use core::fmt;

use heapless::Vec;

use crate::hal::BspError;
use crate::irq::ReceiveHandler;
use crate::types::{ChannelRole, FactoryTest};

/// Line buffer capacity, terminator included
pub const LINE_CAPACITY: usize = 32;

/// Line terminator
pub const TERMINATOR: u8 = b'\n';

/// Bytes held before the terminator; the last slot of a line is the terminator
const LINE_BYTES: usize = LINE_CAPACITY - 1;

/// Sticky pass flags, one per factory test
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FactoryFlags {
    flags: [bool; FactoryTest::ALL.len()],
}

impl FactoryFlags {
    pub const fn new() -> Self {
        Self {
            flags: [false; FactoryTest::ALL.len()],
        }
    }

    /// Latch a flag. There is no way to clear one.
    pub fn set(&mut self, test: FactoryTest) {
        self.flags[test.index()] = true;
    }

    pub fn is_set(&self, test: FactoryTest) -> bool {
        self.flags[test.index()]
    }

    pub fn iter_set(&self) -> impl Iterator<Item = FactoryTest> + '_ {
        FactoryTest::ALL.into_iter().filter(|t| self.is_set(*t))
    }

    pub fn all_passed(&self) -> bool {
        self.flags.iter().all(|f| *f)
    }

    pub fn none_set(&self) -> bool {
        !self.flags.iter().any(|f| *f)
    }
}

impl fmt::Display for FactoryFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, test) in FactoryTest::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            // Keywords are ASCII literals.
            let name = core::str::from_utf8(test.keyword()).map_err(|_| fmt::Error)?;
            write!(f, "{}={}", name, if self.is_set(*test) { "OK" } else { "--" })?;
        }
        Ok(())
    }
}

/// Line accumulator and keyword matcher
#[derive(Debug, Default)]
pub struct CommandParser {
    line: Vec<u8, LINE_BYTES>,
    flags: FactoryFlags,
}

impl CommandParser {
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            flags: FactoryFlags::new(),
        }
    }

    /// Feed one received byte.
    ///
    /// Returns the test latched by a completed line, if any. A line that
    /// fills the buffer without a terminator is discarded and reported as
    /// `BufferFull`; the parser is ready for the next line either way.
    pub fn push(&mut self, byte: u8) -> Result<Option<FactoryTest>, BspError> {
        if byte == TERMINATOR {
            let matched = match_keyword(&self.line);
            if let Some(test) = matched {
                self.flags.set(test);
            }
            self.line.clear();
            return Ok(matched);
        }

        if self.line.push(byte).is_err() {
            self.line.clear();
            return Err(BspError::BufferFull);
        }

        Ok(None)
    }

    pub fn flags(&self) -> &FactoryFlags {
        &self.flags
    }

    /// Bytes of the current unterminated line
    pub fn pending(&self) -> &[u8] {
        &self.line
    }
}

/// First keyword, in fixed order, that the line starts with
fn match_keyword(line: &[u8]) -> Option<FactoryTest> {
    FactoryTest::ALL
        .into_iter()
        .find(|test| line.starts_with(test.keyword()))
}

impl ReceiveHandler for CommandParser {
    const ROLE: ChannelRole = ChannelRole::Debug;

    fn on_byte(&mut self, byte: u8) -> Result<(), BspError> {
        let _matched = self.push(byte)?;

        #[cfg(feature = "defmt")]
        if let Some(test) = _matched {
            defmt::info!("Factory check latched: {}", test);
        }

        Ok(())
    }
}
