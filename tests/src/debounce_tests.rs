//! Debounce behavior over whole press sequences

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use bsp_core::hal::mock::{MockClock, MockInput};
    use bsp_core::{ActiveLevel, BoardConfig, KeyId, KeyScanner, TriggerState};
    use proptest::prelude::*;
    use rstest::rstest;

    /// Scan once per tick with the key level taken from `levels`.
    /// Returns (events reported, press counter, final state).
    fn run(levels: &[bool], start_tick: u32) -> (usize, u32, TriggerState) {
        let pin = Cell::new(false);
        let clock = MockClock::starting_at(start_tick);
        let mut keys = KeyScanner::new(
            [(KeyId::StartStop, MockInput::new(&pin))],
            ActiveLevel::High,
            &BoardConfig::default(),
        )
        .unwrap();

        let mut events = 0;
        for &level in levels {
            pin.set(level);
            events += keys.scan(&clock).unwrap().len();
            clock.advance(1);
        }
        let key = keys.key(KeyId::StartStop).unwrap();
        (events, key.press_count(), key.state())
    }

    /// Key DOWN on ticks `0..=last_down` of the press, UP afterwards
    fn press(last_down: usize) -> Vec<bool> {
        let mut levels = vec![false; 3];
        levels.extend(std::iter::repeat(true).take(last_down + 1));
        levels.extend(std::iter::repeat(false).take(30));
        levels
    }

    #[rstest]
    #[case::tap(3, 0)]
    #[case::just_short(9, 0)]
    #[case::exactly_window(10, 1)]
    #[case::long_hold(200, 1)]
    fn test_press_length(#[case] last_down: usize, #[case] presses: u32) {
        let (events, count, state) = run(&press(last_down), 0);
        assert_eq!(events as u32, presses);
        assert_eq!(count, presses);
        assert_eq!(state, TriggerState::Idle);
    }

    #[test]
    fn test_bounce_inside_window_still_confirms() {
        // DOWN at the start and end of the window is all the engine checks
        let mut levels = vec![true];
        levels.extend([false, true, false, false, true, false, false, false, false]);
        levels.push(true);
        let (events, _, _) = run(&levels, 0);
        assert_eq!(events, 1);
    }

    #[test]
    fn test_two_keys_independent() {
        let a = Cell::new(false);
        let b = Cell::new(false);
        let clock = MockClock::new();
        let mut keys = KeyScanner::new(
            [(KeyId::StartStop, MockInput::new(&a)), (KeyId::CwCcw, MockInput::new(&b))],
            ActiveLevel::High,
            &BoardConfig::default(),
        )
        .unwrap();

        a.set(true);
        for _ in 0..5 {
            keys.scan(&clock).unwrap();
            clock.advance(1);
        }
        b.set(true);
        let mut seen = Vec::new();
        for _ in 0..20 {
            for event in keys.scan(&clock).unwrap() {
                seen.push((event.key, event.at.as_millis()));
            }
            clock.advance(1);
        }

        assert_eq!(seen, vec![(KeyId::StartStop, 10), (KeyId::CwCcw, 15)]);
    }

    #[test]
    fn test_event_text() {
        let pin = Cell::new(true);
        let clock = MockClock::new();
        let mut keys = KeyScanner::new(
            [(KeyId::CwCcw, MockInput::new(&pin))],
            ActiveLevel::High,
            &BoardConfig::default(),
        )
        .unwrap();
        keys.scan(&clock).unwrap();
        clock.advance(10);
        let events = keys.scan(&clock).unwrap();
        assert_eq!(events[0].to_string(), "CW/CCW Key Down");
    }

    #[test]
    fn test_pin_reads_with_hal_mock() {
        use embedded_hal_mock::eh1::pin::{Mock as PinMock, State, Transaction};

        let expectations = [
            // t=0: arms the key
            Transaction::get(State::High),
            // t=5: still pending
            Transaction::get(State::High),
            // t=10: scan sample plus confirming re-sample
            Transaction::get(State::High),
            Transaction::get(State::High),
            // t=11: released
            Transaction::get(State::Low),
        ];
        let mut pin = PinMock::new(&expectations);
        let clock = MockClock::new();
        let mut keys = KeyScanner::new(
            [(KeyId::StartStop, pin.clone())],
            ActiveLevel::High,
            &BoardConfig::default(),
        )
        .unwrap();

        assert!(keys.scan(&clock).unwrap().is_empty());
        clock.set(5);
        assert!(keys.scan(&clock).unwrap().is_empty());
        clock.set(10);
        assert_eq!(keys.scan(&clock).unwrap().len(), 1);
        clock.set(11);
        assert!(keys.scan(&clock).unwrap().is_empty());
        assert_eq!(keys.key(KeyId::StartStop).unwrap().state(), TriggerState::Idle);

        drop(keys);
        pin.done();
    }

    proptest! {
        #[test]
        fn prop_count_matches_events(levels in proptest::collection::vec(any::<bool>(), 0..300)) {
            let (events, count, _) = run(&levels, 0);
            prop_assert_eq!(events as u32, count);
        }

        #[test]
        fn prop_at_most_one_press_per_down_run(levels in proptest::collection::vec(any::<bool>(), 0..300)) {
            let runs = levels
                .iter()
                .zip(std::iter::once(&false).chain(levels.iter()))
                .filter(|(now, prev)| **now && !**prev)
                .count();
            let (events, _, _) = run(&levels, 0);
            prop_assert!(events <= runs);
        }

        #[test]
        fn prop_no_press_when_down_samples_span_less_than_window(
            offset in 0usize..50,
            pattern in proptest::collection::vec(any::<bool>(), 0..10),
        ) {
            let mut levels = vec![false; offset];
            levels.extend(pattern);
            levels.extend(std::iter::repeat(false).take(20));
            let (events, _, state) = run(&levels, 0);
            prop_assert_eq!(events, 0);
            prop_assert_eq!(state, TriggerState::Idle);
        }

        #[test]
        fn prop_hold_confirms_once_at_any_tick(start in any::<u32>(), hold in 10usize..100) {
            let (events, count, _) = run(&press(hold), start);
            prop_assert_eq!(events, 1);
            prop_assert_eq!(count, 1);
        }
    }
}
