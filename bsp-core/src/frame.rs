//! RS-485 receive buffer and fixed-size frame detection
//!
//! The receive interrupt appends bytes; the main loop polls for a complete
//! frame. A frame on this bus is exactly [`FRAME_LEN`] bytes.

use heapless::Vec;

use crate::hal::BspError;
use crate::irq::ReceiveHandler;
use crate::types::ChannelRole;

/// Receive buffer capacity
pub const RX_CAPACITY: usize = 1024;

/// Request/response frame size on the RS-485 bus
pub const FRAME_LEN: usize = 8;

/// Bytes received on the bus since the last frame was taken
#[derive(Debug, Default)]
pub struct FrameAccumulator {
    buf: Vec<u8, RX_CAPACITY>,
}

impl FrameAccumulator {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append one received byte.
    ///
    /// A full buffer is emptied and `BufferFull` returned; the byte that hit
    /// the limit is dropped with the rest.
    pub fn push(&mut self, byte: u8) -> Result<(), BspError> {
        if self.buf.push(byte).is_err() {
            self.buf.clear();
            return Err(BspError::BufferFull);
        }
        Ok(())
    }

    /// Take the buffer if it holds exactly one frame, leaving it empty.
    /// Any other fill level is left untouched.
    pub fn take_frame(&mut self) -> Option<[u8; FRAME_LEN]> {
        if self.buf.len() != FRAME_LEN {
            return None;
        }
        let mut frame = [0u8; FRAME_LEN];
        frame.copy_from_slice(&self.buf);
        self.buf.clear();
        Some(frame)
    }

    /// Current write index
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl ReceiveHandler for FrameAccumulator {
    const ROLE: ChannelRole = ChannelRole::Rs485;

    fn on_byte(&mut self, byte: u8) -> Result<(), BspError> {
        self.push(byte)
    }
}
