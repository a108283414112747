//! UART interrupt dispatch
//!
//! Every UART vector runs [`service`] with the handler bound to that
//! channel. The handler type is fixed when the firmware wires up its
//! vectors, one implementation per channel role.

use crate::hal::{BspError, UartIrqSource, UartStatus};
use crate::types::ChannelRole;

/// Receive path of one UART channel
pub trait ReceiveHandler {
    /// Channel this handler serves
    const ROLE: ChannelRole;

    /// Called once per received byte, from interrupt context
    fn on_byte(&mut self, byte: u8) -> Result<(), BspError>;
}

impl<H: ReceiveHandler + ?Sized> ReceiveHandler for &mut H {
    const ROLE: ChannelRole = H::ROLE;

    fn on_byte(&mut self, byte: u8) -> Result<(), BspError> {
        (**self).on_byte(byte)
    }
}

/// Service one UART interrupt.
///
/// Conditions are checked in a fixed order: receive-data-ready,
/// transmit-empty (nothing to do), receive-overrun. The overrun flag is
/// cleared even when the handler rejected the byte; the handler's error is
/// returned afterwards.
pub fn service<U, H>(uart: &mut U, handler: &mut H) -> Result<UartStatus, BspError>
where
    U: UartIrqSource,
    H: ReceiveHandler,
{
    let status = uart.status();
    let mut result = Ok(());

    if status.rx_ready {
        let byte = uart.read_data();
        result = handler.on_byte(byte);
    }

    if status.tx_empty {
        // Transmit is polled; the TX-empty interrupt is never enabled.
    }

    if status.overrun {
        uart.clear_overrun();
        #[cfg(feature = "defmt")]
        defmt::warn!("{}: receive overrun cleared", H::ROLE);
    }

    result.map(|_| status)
}
