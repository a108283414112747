//! RS-485 frame echo and direction turnaround ordering

#[cfg(test)]
mod tests {
    use crate::recording::{Event, Log, RecordingDelay, RecordingPin, RecordingSerial};
    use bsp_core::{ActiveLevel, BoardConfig, BspError, FrameAccumulator, Rs485Port, FRAME_LEN};
    use rstest::rstest;

    fn board_port(log: &Log) -> Rs485Port<RecordingSerial, RecordingPin, RecordingDelay> {
        Rs485Port::new(
            log.serial(),
            log.pin(),
            log.delay(),
            ActiveLevel::Low,
            &BoardConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_echo_timeline() {
        let log = Log::new();
        let mut port = board_port(&log);
        let mut rx = FrameAccumulator::new();

        for b in 0x01..=0x08u8 {
            rx.push(b).unwrap();
        }
        assert_eq!(port.echo_frame(&mut rx), Ok(true));

        let mut expected = vec![
            Event::Pin(true), // receive mode at construction
            Event::Pin(false),
            Event::DelayMs(1),
        ];
        expected.extend((0x01..=0x08u8).map(Event::Byte));
        expected.extend([Event::DelayMs(1), Event::Pin(true)]);

        assert_eq!(log.events(), expected);
        assert!(rx.is_empty());
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(7)]
    #[case(9)]
    #[case(64)]
    fn test_no_echo_unless_exactly_one_frame(#[case] fill: usize) {
        let log = Log::new();
        let mut port = board_port(&log);
        let mut rx = FrameAccumulator::new();
        for i in 0..fill {
            rx.push(i as u8).unwrap();
        }
        log.clear();

        assert_eq!(port.echo_frame(&mut rx), Ok(false));
        assert!(log.events().is_empty());
        assert_eq!(rx.len(), fill);
        assert_eq!(port.frames_sent(), 0);
    }

    #[test]
    fn test_consecutive_frames() {
        let log = Log::new();
        let mut port = board_port(&log);
        let mut rx = FrameAccumulator::new();

        for round in 0..3u8 {
            for i in 0..FRAME_LEN as u8 {
                rx.push(round * 0x10 + i).unwrap();
            }
            assert_eq!(port.echo_frame(&mut rx), Ok(true));
        }

        assert_eq!(port.frames_sent(), 3);
        assert_eq!(log.bytes().len(), 3 * FRAME_LEN);
        assert_eq!(&log.bytes()[8..16], &[0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17]);
    }

    #[test]
    fn test_bus_released_after_uart_fault() {
        let log = Log::new();
        let mut port = Rs485Port::new(
            log.serial().failing_after(3),
            log.pin(),
            log.delay(),
            ActiveLevel::Low,
            &BoardConfig::default(),
        )
        .unwrap();

        assert_eq!(port.send(&[1, 2, 3, 4, 5]), Err(BspError::Uart));

        let events = log.events();
        assert_eq!(log.bytes(), vec![1, 2, 3]);
        assert_eq!(events.last(), Some(&Event::Pin(true)));
        assert_eq!(events[events.len() - 2], Event::DelayMs(1));
    }

    #[rstest]
    #[case(ActiveLevel::Low, [true, false, true])]
    #[case(ActiveLevel::High, [false, true, false])]
    fn test_direction_polarity(#[case] level: ActiveLevel, #[case] expected: [bool; 3]) {
        let log = Log::new();
        let mut port = Rs485Port::new(
            log.serial(),
            log.pin(),
            log.delay(),
            level,
            &BoardConfig::default(),
        )
        .unwrap();
        port.send(&[0xAA]).unwrap();

        let levels: Vec<bool> = log
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Pin(high) => Some(high),
                _ => None,
            })
            .collect();
        assert_eq!(levels, expected);
    }

    #[test]
    fn test_longer_turnaround_from_config() {
        let log = Log::new();
        let config = BoardConfig::new(10, 115_200, 3).unwrap();
        let mut port = Rs485Port::new(log.serial(), log.pin(), log.delay(), ActiveLevel::Low, &config)
            .unwrap();
        port.send(&[0x55]).unwrap();

        let delays: Vec<Event> = log
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::DelayMs(_)))
            .collect();
        assert_eq!(delays, vec![Event::DelayMs(3), Event::DelayMs(3)]);
    }

    #[test]
    fn test_direction_pin_with_hal_mock() {
        use bsp_core::hal::mock::{MockDelay, MockSerial};
        use embedded_hal_mock::eh1::pin::{Mock as PinMock, State, Transaction};

        let expectations = [
            Transaction::set(State::High),
            Transaction::set(State::Low),
            Transaction::set(State::High),
        ];
        let mut direction = PinMock::new(&expectations);

        let mut port = Rs485Port::new(
            MockSerial::new(),
            direction.clone(),
            MockDelay::new(),
            ActiveLevel::Low,
            &BoardConfig::default(),
        )
        .unwrap();
        port.send(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        let (tx, _, delay) = port.release();
        assert_eq!(tx.sent(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(delay.count(), 2);
        direction.done();
    }
}
