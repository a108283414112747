//! N32G435 Hardware Implementation
//!
//! 128KB Flash / 32KB RAM. Runs from the 16 MHz HSI left selected after
//! reset; all bus prescalers stay at /1.

use core::convert::Infallible;
use core::ptr::{read_volatile, write_volatile};

use bsp_core::hal::{BspError, SerialWrite, UartIrqSource, UartStatus};
use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{NVIC, SYST};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Core and peripheral bus clock
pub const SYSCLK_HZ: u32 = 16_000_000;

/// NVIC priority bits implemented on this part
const NVIC_PRIO_BITS: u8 = 4;

/// N32G435 Memory Map and Register Base Addresses
const RCC_BASE: u32 = 0x4002_1000;
const GPIOA_BASE: u32 = 0x4001_0800;
const GPIOB_BASE: u32 = 0x4001_0C00;
const GPIOC_BASE: u32 = 0x4001_1000;
const GPIOD_BASE: u32 = 0x4001_1400;
const TIM1_BASE: u32 = 0x4001_2C00;
const USART3_BASE: u32 = 0x4000_4800;
const UART4_BASE: u32 = 0x4001_6000;
const UART5_BASE: u32 = 0x4001_6400;

/// RCC Register offsets
const RCC_APB2PCLKEN: u32 = 0x18;
const RCC_APB1PCLKEN: u32 = 0x1C;

const APB2_AFIO: u32 = 1 << 0;
const APB2_IOPA: u32 = 1 << 2;
const APB2_IOPB: u32 = 1 << 3;
const APB2_IOPC: u32 = 1 << 4;
const APB2_IOPD: u32 = 1 << 5;
const APB2_TIM1: u32 = 1 << 11;
const APB2_UART4: u32 = 1 << 17;
const APB2_UART5: u32 = 1 << 18;
const APB1_USART3: u32 = 1 << 18;

/// GPIO Register offsets
const GPIO_PMODE: u32 = 0x00; // Mode, 2 bits per pin
const GPIO_POTYPE: u32 = 0x04; // Output type
const GPIO_PUPD: u32 = 0x0C; // Pull-up/pull-down, 2 bits per pin
const GPIO_PID: u32 = 0x10; // Input data
const GPIO_PBSC: u32 = 0x18; // Bit set (low half) / clear (high half)
const GPIO_AFL: u32 = 0x20; // Alternate function, pins 0-7
const GPIO_AFH: u32 = 0x24; // Alternate function, pins 8-15

/// USART Register offsets
const USART_STS: u32 = 0x00;
const USART_DAT: u32 = 0x04;
const USART_BRCF: u32 = 0x08;
const USART_CTRL1: u32 = 0x0C;
const USART_CTRL2: u32 = 0x10;
const USART_CTRL3: u32 = 0x14;

const STS_OREF: u32 = 1 << 3;
const STS_RXDNE: u32 = 1 << 5;
const STS_TXDE: u32 = 1 << 7;

const CTRL1_RXEN: u32 = 1 << 2;
const CTRL1_TXEN: u32 = 1 << 3;
const CTRL1_RXDNEIEN: u32 = 1 << 5;
const CTRL1_UEN: u32 = 1 << 13;

/// TIM1 Register offsets
const TIM_CTRL1: u32 = 0x00;
const TIM_DINTEN: u32 = 0x0C;
const TIM_STS: u32 = 0x10;
const TIM_PSC: u32 = 0x28;
const TIM_AR: u32 = 0x2C;

const TIM_UIEN: u32 = 1 << 0;
const TIM_UDITF: u32 = 1 << 0;
const TIM_CNTEN: u32 = 1 << 0;
const TIM_ARPEN: u32 = 1 << 7;

unsafe fn modify(addr: u32, f: impl FnOnce(u32) -> u32) {
    let reg = addr as *mut u32;
    write_volatile(reg, f(read_volatile(reg)));
}

/// Enable the bus clocks for every peripheral the board uses
pub fn enable_peripheral_clocks() {
    unsafe {
        modify(RCC_BASE + RCC_APB2PCLKEN, |v| {
            v | APB2_AFIO | APB2_IOPA | APB2_IOPB | APB2_IOPC | APB2_IOPD | APB2_TIM1 | APB2_UART4 | APB2_UART5
        });
        modify(RCC_BASE + RCC_APB1PCLKEN, |v| v | APB1_USART3);
    }
}

// ========================================
// GPIO
// ========================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
}

impl Port {
    const fn base(self) -> u32 {
        match self {
            Port::A => GPIOA_BASE,
            Port::B => GPIOB_BASE,
            Port::C => GPIOC_BASE,
            Port::D => GPIOD_BASE,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pull {
    None,
    Up,
    Down,
}

impl Pull {
    const fn bits(self) -> u32 {
        match self {
            Pull::None => 0b00,
            Pull::Up => 0b01,
            Pull::Down => 0b10,
        }
    }
}

const MODE_INPUT: u32 = 0b00;
const MODE_OUTPUT: u32 = 0b01;
const MODE_AF: u32 = 0b10;

fn configure_pin(port: Port, pin: u8, mode: u32, pull: Pull) {
    let base = port.base();
    let shift = u32::from(pin) * 2;
    unsafe {
        modify(base + GPIO_PUPD, |v| (v & !(0b11 << shift)) | (pull.bits() << shift));
        // Push-pull for outputs and alternate functions
        modify(base + GPIO_POTYPE, |v| v & !(1 << pin));
        modify(base + GPIO_PMODE, |v| (v & !(0b11 << shift)) | (mode << shift));
    }
}

/// Route `pin` to alternate function `af`
pub fn configure_alternate(port: Port, pin: u8, af: u8, pull: Pull) {
    let (reg, shift) = if pin < 8 {
        (GPIO_AFL, u32::from(pin) * 4)
    } else {
        (GPIO_AFH, u32::from(pin - 8) * 4)
    };
    unsafe {
        modify(port.base() + reg, |v| (v & !(0xF << shift)) | (u32::from(af) << shift));
    }
    configure_pin(port, pin, MODE_AF, pull);
}

/// GPIO input with real register access
pub struct Input {
    port: Port,
    pin: u8,
}

impl Input {
    pub fn new(port: Port, pin: u8, pull: Pull) -> Self {
        configure_pin(port, pin, MODE_INPUT, pull);
        Self { port, pin }
    }

    fn read(&self) -> bool {
        let pid = unsafe { read_volatile((self.port.base() + GPIO_PID) as *const u32) };
        pid & (1 << self.pin) != 0
    }
}

impl ErrorType for Input {
    type Error = Infallible;
}

impl InputPin for Input {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.read())
    }
}

/// GPIO push-pull output with real register access
pub struct Output {
    port: Port,
    pin: u8,
}

impl Output {
    /// Set the initial level before switching the pin to output
    pub fn new(port: Port, pin: u8, initially_high: bool) -> Self {
        let mut out = Self { port, pin };
        out.write(initially_high);
        configure_pin(port, pin, MODE_OUTPUT, Pull::None);
        out
    }

    fn write(&mut self, high: bool) {
        let bit = if high { 1 << self.pin } else { 1 << (self.pin + 16) };
        unsafe {
            write_volatile((self.port.base() + GPIO_PBSC) as *mut u32, bit);
        }
    }
}

impl ErrorType for Output {
    type Error = Infallible;
}

impl OutputPin for Output {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

// ========================================
// Interrupts
// ========================================

/// Device interrupts used by the board
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum Interrupt {
    TIM1_UP = 25,
    USART3 = 39,
    UART4 = 52,
    UART5 = 53,
}

unsafe impl InterruptNumber for Interrupt {
    fn number(self) -> u16 {
        self as u16
    }
}

/// Set the preemption priority and unmask `irq`
pub fn enable_interrupt(nvic: &mut NVIC, irq: Interrupt, priority: u8) {
    unsafe {
        nvic.set_priority(irq, priority << (8 - NVIC_PRIO_BITS));
        NVIC::unmask(irq);
    }
}

// ========================================
// SysTick
// ========================================

/// 1 kHz SysTick from the core clock
pub fn configure_systick(syst: &mut SYST) {
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(SYSCLK_HZ / 1_000 - 1);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();
}

// ========================================
// UART
// ========================================

/// The three UARTs wired on the board
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Usart3,
    Uart4,
    Uart5,
}

impl UartId {
    const fn base(self) -> u32 {
        match self {
            UartId::Usart3 => USART3_BASE,
            UartId::Uart4 => UART4_BASE,
            UartId::Uart5 => UART5_BASE,
        }
    }

    pub const fn interrupt(self) -> Interrupt {
        match self {
            UartId::Usart3 => Interrupt::USART3,
            UartId::Uart4 => Interrupt::UART4,
            UartId::Uart5 => Interrupt::UART5,
        }
    }
}

/// Configure 8N1 at `baud` with the receive interrupt enabled.
///
/// Returns the transmit and receive halves; the receive half belongs to
/// the interrupt handler.
pub fn init_uart(id: UartId, baud: u32) -> Result<(UartTx, UartRx), BspError> {
    if baud == 0 || SYSCLK_HZ / baud < 16 {
        return Err(BspError::InvalidConfig);
    }
    let base = id.base();
    unsafe {
        write_volatile((base + USART_CTRL1) as *mut u32, 0);
        // Oversampling by 16: mantissa and fraction pack into one divider
        write_volatile((base + USART_BRCF) as *mut u32, (SYSCLK_HZ + baud / 2) / baud);
        // 1 stop bit, no flow control
        write_volatile((base + USART_CTRL2) as *mut u32, 0);
        write_volatile((base + USART_CTRL3) as *mut u32, 0);
        // 8 data bits, no parity
        write_volatile(
            (base + USART_CTRL1) as *mut u32,
            CTRL1_UEN | CTRL1_TXEN | CTRL1_RXEN | CTRL1_RXDNEIEN,
        );
    }
    Ok((UartTx { base }, UartRx { base }))
}

/// Transmit half of a UART
pub struct UartTx {
    base: u32,
}

impl SerialWrite for UartTx {
    fn write(&mut self, byte: u8) -> nb::Result<(), BspError> {
        let sts = unsafe { read_volatile((self.base + USART_STS) as *const u32) };
        if sts & STS_TXDE == 0 {
            return Err(nb::Error::WouldBlock);
        }
        unsafe {
            write_volatile((self.base + USART_DAT) as *mut u32, u32::from(byte));
        }
        Ok(())
    }
}

/// Receive half of a UART, serviced from its interrupt
pub struct UartRx {
    base: u32,
}

impl UartIrqSource for UartRx {
    fn status(&mut self) -> UartStatus {
        let sts = unsafe { read_volatile((self.base + USART_STS) as *const u32) };
        UartStatus {
            rx_ready: sts & STS_RXDNE != 0,
            tx_empty: sts & STS_TXDE != 0,
            overrun: sts & STS_OREF != 0,
        }
    }

    fn read_data(&mut self) -> u8 {
        let dat = unsafe { read_volatile((self.base + USART_DAT) as *const u32) };
        (dat & 0xFF) as u8
    }

    fn clear_overrun(&mut self) {
        unsafe {
            let _ = read_volatile((self.base + USART_STS) as *const u32);
            let _ = read_volatile((self.base + USART_DAT) as *const u32);
        }
    }
}

// ========================================
// TIM1 time base
// ========================================

/// TIM1 update interrupt at `rate_hz` from a 1 MHz counter clock
pub fn configure_time_base(rate_hz: u32) -> Result<(), BspError> {
    let period = match 1_000_000u32.checked_div(rate_hz) {
        Some(p) if (2..=0x1_0000).contains(&p) => p,
        _ => return Err(BspError::InvalidConfig),
    };
    unsafe {
        write_volatile((TIM1_BASE + TIM_PSC) as *mut u32, SYSCLK_HZ / 1_000_000 - 1);
        write_volatile((TIM1_BASE + TIM_AR) as *mut u32, period - 1);
        write_volatile((TIM1_BASE + TIM_STS) as *mut u32, !TIM_UDITF);
        modify(TIM1_BASE + TIM_DINTEN, |v| v | TIM_UIEN);
        write_volatile((TIM1_BASE + TIM_CTRL1) as *mut u32, TIM_ARPEN | TIM_CNTEN);
    }
    Ok(())
}

/// Acknowledge a TIM1 update. Returns whether one was pending.
pub fn clear_time_base_update() -> bool {
    unsafe {
        let sts = read_volatile((TIM1_BASE + TIM_STS) as *const u32);
        if sts & TIM_UDITF == 0 {
            return false;
        }
        // Flags are cleared by writing 0, other bits written 1 are ignored
        write_volatile((TIM1_BASE + TIM_STS) as *mut u32, !TIM_UDITF);
    }
    true
}
