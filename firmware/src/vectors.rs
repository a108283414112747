//! Device interrupt vector table
//!
//! Only the vectors the board uses are populated. `device.x` defaults each
//! handler to `DefaultHandler`; the firmware binary overrides them.

pub union Vector {
    handler: unsafe extern "C" fn(),
    reserved: usize,
}

extern "C" {
    fn TIM1_UP();
    fn USART3();
    fn UART4();
    fn UART5();
}

const RESERVED: Vector = Vector { reserved: 0 };

#[repr(C)]
pub struct VectorTable {
    _irq0_24: [Vector; 25],
    tim1_up: Vector,
    _irq26_38: [Vector; 13],
    usart3: Vector,
    _irq40_51: [Vector; 12],
    uart4: Vector,
    uart5: Vector,
}

#[link_section = ".vector_table.interrupts"]
#[no_mangle]
pub static __INTERRUPTS: VectorTable = VectorTable {
    _irq0_24: [RESERVED; 25],
    tim1_up: Vector { handler: TIM1_UP },
    _irq26_38: [RESERVED; 13],
    usart3: Vector { handler: USART3 },
    _irq40_51: [RESERVED; 12],
    uart4: Vector { handler: UART4 },
    uart5: Vector { handler: UART5 },
};
