#![no_std]

//! Board support for the N32G435 motor-controller board
//!
//! Register-level drivers live in [`n32g435_hardware`]; [`Board::init`]
//! wires them to the `bsp-core` types in the pin map below.

pub mod n32g435_hardware;
pub mod vectors;

pub use bsp_core;

use bsp_core::{ActiveLevel, BoardConfig, BspError, KeyId, KeyScanner, Leds, TestSignal};
use cortex_m::peripheral::{NVIC, SYST};

pub use crate::n32g435_hardware::*;

/// Pin assignments as `(port, pin)` plus alternate-function numbers
pub mod pins {
    use crate::n32g435_hardware::Port;

    pub type PinId = (Port, u8);

    // Debug console, UART4
    pub const DEBUG_TX: PinId = (Port::B, 0);
    pub const DEBUG_RX: PinId = (Port::B, 1);
    pub const DEBUG_AF: u8 = 6;

    // Host computer, UART5
    pub const HOST_TX: PinId = (Port::C, 12);
    pub const HOST_RX: PinId = (Port::D, 2);
    pub const HOST_AF: u8 = 6;

    // RS-485, USART3
    pub const RS485_TX: PinId = (Port::B, 10);
    pub const RS485_TX_AF: u8 = 0;
    pub const RS485_RX: PinId = (Port::B, 11);
    pub const RS485_RX_AF: u8 = 5;
    /// Transceiver direction: LOW transmits, HIGH receives
    pub const RS485_EN: PinId = (Port::C, 8);

    // Keys, pulled down, HIGH while pressed
    pub const KEY_START_STOP: PinId = (Port::C, 6);
    pub const KEY_CW_CCW: PinId = (Port::C, 7);

    pub const LED1: PinId = (Port::C, 15);
    pub const LED2: PinId = (Port::C, 14);
    pub const LED3: PinId = (Port::C, 13);

    /// Square-wave output driven by the TIM1 time base
    pub const TEST_IO: PinId = (Port::C, 5);
}

/// Level that enables the RS-485 driver
pub const RS485_TRANSMIT_LEVEL: ActiveLevel = ActiveLevel::Low;

/// Preemption priority shared by the UART and timer interrupts
pub const IRQ_PRIORITY: u8 = 10;

/// TIM1 update rate
pub const TIME_BASE_HZ: u32 = 1_000;

/// Text written to the debug console once startup is done
pub const BANNER: &str = "02-n32g435_timerbase";

/// Both halves of one UART
pub struct UartPair {
    pub tx: UartTx,
    pub rx: UartRx,
}

/// Every peripheral the firmware drives, configured and idle
pub struct Board {
    pub keys: KeyScanner<Input, 2>,
    pub leds: Leds<Output>,
    pub test_signal: TestSignal<Output>,
    pub debug: UartPair,
    pub host: UartPair,
    pub rs485: UartPair,
    pub rs485_direction: Output,
}

impl Board {
    /// Clock, pin and UART setup. Interrupts stay masked until
    /// [`start_interrupts`].
    pub fn init(config: &BoardConfig) -> Result<Self, BspError> {
        use pins::*;

        enable_peripheral_clocks();

        configure_alternate(DEBUG_TX.0, DEBUG_TX.1, DEBUG_AF, Pull::None);
        configure_alternate(DEBUG_RX.0, DEBUG_RX.1, DEBUG_AF, Pull::None);
        configure_alternate(HOST_TX.0, HOST_TX.1, HOST_AF, Pull::None);
        configure_alternate(HOST_RX.0, HOST_RX.1, HOST_AF, Pull::Up);
        configure_alternate(RS485_TX.0, RS485_TX.1, RS485_TX_AF, Pull::None);
        configure_alternate(RS485_RX.0, RS485_RX.1, RS485_RX_AF, Pull::Up);

        // Listen on the bus from the first instruction onwards
        let rs485_direction = Output::new(RS485_EN.0, RS485_EN.1, true);

        let (tx, rx) = init_uart(UartId::Uart4, config.baud_rate)?;
        let debug = UartPair { tx, rx };
        let (tx, rx) = init_uart(UartId::Uart5, config.baud_rate)?;
        let host = UartPair { tx, rx };
        let (tx, rx) = init_uart(UartId::Usart3, config.baud_rate)?;
        let rs485 = UartPair { tx, rx };

        let test_signal = TestSignal::new(Output::new(TEST_IO.0, TEST_IO.1, false));

        let leds = Leds::new([
            Output::new(LED1.0, LED1.1, false),
            Output::new(LED2.0, LED2.1, false),
            Output::new(LED3.0, LED3.1, false),
        ]);

        let keys = KeyScanner::new(
            [
                (
                    KeyId::StartStop,
                    Input::new(KEY_START_STOP.0, KEY_START_STOP.1, Pull::Down),
                ),
                (KeyId::CwCcw, Input::new(KEY_CW_CCW.0, KEY_CW_CCW.1, Pull::Down)),
            ],
            ActiveLevel::High,
            config,
        )?;

        #[cfg(feature = "defmt")]
        defmt::info!("Board initialized: {}", config);

        Ok(Self {
            keys,
            leds,
            test_signal,
            debug,
            host,
            rs485,
            rs485_direction,
        })
    }
}

/// Start the SysTick and TIM1 time bases and unmask the UART vectors.
///
/// Call once the interrupt handlers' state is in place.
pub fn start_interrupts(nvic: &mut NVIC, syst: &mut SYST) -> Result<(), BspError> {
    configure_systick(syst);
    configure_time_base(TIME_BASE_HZ)?;

    for id in [UartId::Uart4, UartId::Uart5, UartId::Usart3] {
        enable_interrupt(nvic, id.interrupt(), IRQ_PRIORITY);
    }
    enable_interrupt(nvic, Interrupt::TIM1_UP, IRQ_PRIORITY);
    Ok(())
}
