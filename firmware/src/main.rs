#![no_std]
#![no_main]

// Logging support
#[cfg(feature = "defmt")]
use defmt::{error, info, warn};
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_halt as _;

// Define simple logging macros when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! error {
    ($($arg:tt)*) => {};
}

use core::cell::RefCell;
use core::fmt::Write;

use bsp_firmware::bsp_core::{
    self, irq, CommandParser, Console, FrameAccumulator, HostEcho, ReceiveHandler, Rs485Port,
    TestSignal, TickCounter, TickDelay, TickSource,
};
use bsp_firmware::{
    clear_time_base_update, start_interrupts, Board, Output, UartRx, UartTx, BANNER,
    RS485_TRANSMIT_LEVEL,
};
use cortex_m_rt::{entry, exception};
use critical_section::Mutex;

/// Millisecond tick, advanced by SysTick
static TICKS: TickCounter = TickCounter::new();

/// Receive half of a UART with the handler bound to its vector
struct RxChannel<H> {
    uart: UartRx,
    handler: H,
}

static DEBUG_RX: Mutex<RefCell<Option<RxChannel<CommandParser>>>> = Mutex::new(RefCell::new(None));
static HOST_RX: Mutex<RefCell<Option<RxChannel<HostEcho<UartTx>>>>> =
    Mutex::new(RefCell::new(None));
static RS485_RX: Mutex<RefCell<Option<UartRx>>> = Mutex::new(RefCell::new(None));
/// Filled by the USART3 vector, drained by the main loop
static RS485_FRAME: Mutex<RefCell<FrameAccumulator>> =
    Mutex::new(RefCell::new(FrameAccumulator::new()));
static TEST_SIGNAL: Mutex<RefCell<Option<TestSignal<Output>>>> = Mutex::new(RefCell::new(None));

/// Fail-stop: spin until a debugger or watchdog intervenes
fn halt() -> ! {
    loop {
        cortex_m::asm::nop();
    }
}

#[entry]
fn main() -> ! {
    let config = bsp_core::default_config();

    let Board {
        mut keys,
        mut leds,
        test_signal,
        debug,
        host,
        rs485,
        rs485_direction,
    } = match Board::init(&config) {
        Ok(board) => board,
        Err(_e) => {
            error!("Board init failed: {}", _e);
            halt()
        }
    };

    let mut console = Console::new(debug.tx);
    let mut rs485_port = match Rs485Port::new(
        rs485.tx,
        rs485_direction,
        TickDelay::new(&TICKS),
        RS485_TRANSMIT_LEVEL,
        &config,
    ) {
        Ok(port) => port,
        Err(_e) => {
            error!("RS-485 port init failed: {}", _e);
            halt()
        }
    };

    critical_section::with(|cs| {
        DEBUG_RX.borrow(cs).replace(Some(RxChannel {
            uart: debug.rx,
            handler: CommandParser::new(),
        }));
        HOST_RX.borrow(cs).replace(Some(RxChannel {
            uart: host.rx,
            handler: HostEcho::new(host.tx),
        }));
        RS485_RX.borrow(cs).replace(Some(rs485.rx));
        TEST_SIGNAL.borrow(cs).replace(Some(test_signal));
    });

    let Some(mut core) = cortex_m::Peripherals::take() else {
        error!("Core peripherals already taken");
        halt()
    };
    if let Err(_e) = start_interrupts(&mut core.NVIC, &mut core.SYST) {
        error!("Interrupt setup failed: {}", _e);
        halt()
    }

    if console.println(BANNER).is_err() {
        warn!("Banner write failed");
    }
    if let Err(_e) = leds.set_all(true) {
        warn!("LED init failed: {}", _e);
    }
    info!("N32G435 BSP v{} running", bsp_core::VERSION);

    let mut last_scan = TICKS.now();
    loop {
        // Phase 1: key scan, once per tick
        let now = TICKS.now();
        if now != last_scan {
            last_scan = now;
            match keys.scan(&TICKS) {
                Ok(events) => {
                    for event in events {
                        if write!(console, "{}\r\n", event).is_err() {
                            warn!("Debug console write failed");
                        }
                    }
                }
                Err(_e) => {
                    error!("Key scan failed: {}", _e);
                }
            }
        }

        // Phase 2: RS-485 echo. Take the frame with interrupts masked,
        // transmit with them enabled so SysTick keeps counting the turnaround.
        let frame = critical_section::with(|cs| RS485_FRAME.borrow_ref_mut(cs).take_frame());
        if let Some(frame) = frame {
            if let Err(_e) = rs485_port.echo(&frame) {
                warn!("RS-485 echo failed: {}", _e);
            }
        }
    }
}

// ========================================
// Interrupt Handlers
// ========================================

fn service_channel<H: ReceiveHandler>(uart: &mut UartRx, handler: &mut H) {
    if let Err(_e) = irq::service(uart, handler) {
        warn!("{}: {}", H::ROLE, _e);
    }
}

#[exception]
fn SysTick() {
    TICKS.tick();
}

/// Debug console receive
#[allow(non_snake_case)]
#[no_mangle]
extern "C" fn UART4() {
    critical_section::with(|cs| {
        if let Some(ch) = DEBUG_RX.borrow_ref_mut(cs).as_mut() {
            service_channel(&mut ch.uart, &mut ch.handler);
        }
    });
}

/// Host computer receive
#[allow(non_snake_case)]
#[no_mangle]
extern "C" fn UART5() {
    critical_section::with(|cs| {
        if let Some(ch) = HOST_RX.borrow_ref_mut(cs).as_mut() {
            service_channel(&mut ch.uart, &mut ch.handler);
        }
    });
}

/// RS-485 receive
#[allow(non_snake_case)]
#[no_mangle]
extern "C" fn USART3() {
    critical_section::with(|cs| {
        if let Some(uart) = RS485_RX.borrow_ref_mut(cs).as_mut() {
            service_channel(uart, &mut *RS485_FRAME.borrow_ref_mut(cs));
        }
    });
}

/// TIM1 update: drive the test signal
#[allow(non_snake_case)]
#[no_mangle]
extern "C" fn TIM1_UP() {
    if !clear_time_base_update() {
        return;
    }
    critical_section::with(|cs| {
        if let Some(signal) = TEST_SIGNAL.borrow_ref_mut(cs).as_mut() {
            if let Err(_e) = signal.on_update() {
                warn!("Test signal update failed: {}", _e);
            }
        }
    });
}
