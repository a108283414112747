//! UART interrupt dispatch across the three channel handlers

#[cfg(test)]
mod tests {
    use bsp_core::hal::mock::{MockSerial, MockUart};
    use bsp_core::irq::{self, ReceiveHandler};
    use bsp_core::{
        BspError, ChannelRole, CommandParser, FactoryTest, FrameAccumulator, HostEcho, UartStatus,
    };
    use rstest::rstest;

    /// Run one interrupt per queued byte, like the hardware would
    fn deliver<H: ReceiveHandler>(uart: &mut MockUart, handler: &mut H, bytes: &[u8]) {
        for &b in bytes {
            uart.receive(b);
            irq::service(uart, handler).unwrap();
        }
    }

    #[test]
    fn test_host_channel_loops_back_in_order() {
        let mut uart = MockUart::new();
        let mut echo = HostEcho::new(MockSerial::new());

        deliver(&mut uart, &mut echo, b"\x00\x7f\xffhello");
        assert_eq!(echo.inner().sent(), b"\x00\x7f\xffhello");
        assert_eq!(echo.echoed(), 8);
    }

    #[test]
    fn test_rs485_channel_builds_frame() {
        let mut uart = MockUart::new();
        let mut rx = FrameAccumulator::new();

        deliver(&mut uart, &mut rx, &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(rx.take_frame(), None);
        deliver(&mut uart, &mut rx, &[8]);
        assert_eq!(rx.take_frame(), Some([1, 2, 3, 4, 5, 6, 7, 8]));
    }

    #[test]
    fn test_debug_channel_latches_command() {
        let mut uart = MockUart::new();
        let mut parser = CommandParser::new();

        deliver(&mut uart, &mut parser, b"CURRENT\n");
        assert!(parser.flags().is_set(FactoryTest::Current));
        assert_eq!(parser.flags().iter_set().count(), 1);
    }

    #[rstest]
    #[case(false, false)]
    #[case(false, true)]
    #[case(true, false)]
    #[case(true, true)]
    fn test_status_combinations(#[case] data: bool, #[case] overrun: bool) {
        let mut uart = MockUart::new();
        let mut rx = FrameAccumulator::new();
        if data {
            uart.receive(0x5A);
        }
        if overrun {
            uart.raise_overrun();
        }
        uart.set_tx_empty(true);

        let status = irq::service(&mut uart, &mut rx).unwrap();
        assert_eq!(
            status,
            UartStatus {
                rx_ready: data,
                tx_empty: true,
                overrun,
            }
        );
        assert_eq!(rx.len(), usize::from(data));
        assert_eq!(uart.overrun_clears(), usize::from(overrun));
    }

    #[test]
    fn test_rs485_overflow_reported_and_recovers() {
        let mut uart = MockUart::new();
        let mut rx = FrameAccumulator::new();
        for i in 0..bsp_core::frame::RX_CAPACITY {
            rx.push(i as u8).unwrap();
        }

        uart.receive(0xEE);
        assert_eq!(irq::service(&mut uart, &mut rx), Err(BspError::BufferFull));
        assert!(rx.is_empty());

        deliver(&mut uart, &mut rx, &[9; 8]);
        assert_eq!(rx.take_frame(), Some([9; 8]));
    }

    #[test]
    fn test_roles_bound_per_handler() {
        assert_eq!(<CommandParser as ReceiveHandler>::ROLE, ChannelRole::Debug);
        assert_eq!(<HostEcho<MockSerial> as ReceiveHandler>::ROLE, ChannelRole::HostComputer);
        assert_eq!(<FrameAccumulator as ReceiveHandler>::ROLE, ChannelRole::Rs485);
        assert_eq!(<&mut FrameAccumulator as ReceiveHandler>::ROLE, ChannelRole::Rs485);
    }
}
