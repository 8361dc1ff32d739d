pub mod control;
pub mod drive_base;
pub mod proximity;
pub mod serial;

/// Largest image the buffer pool can hold. The default 64x25 configuration fills it.
pub const IMAGE_CAPACITY: usize = 1600;

// Split resources between each of the tasks
use assign_resources::assign_resources;
use embassy_rp::{bind_interrupts, peripherals};

assign_resources! {
    serial: SerialResources {
        uart: UART0,
        tx: PIN_0,
        rx: PIN_1,
    },
    drive_base: DriveBaseResources {
        left_slice: PWM_SLICE1,
        left_a: PIN_2,
        left_b: PIN_3,
        right_slice: PWM_SLICE5,
        right_a: PIN_10,
        right_b: PIN_11,
        sleep: PIN_12,
    },
    selector: SelectorResources {
        bit0: PIN_6,
        bit1: PIN_7,
        bit2: PIN_8,
        bit3: PIN_9,
    },
    leds: LedRingResources {
        led0: PIN_13,
        led1: PIN_14,
        led2: PIN_15,
        led3: PIN_16,
        led4: PIN_17,
        led5: PIN_18,
        led6: PIN_19,
        led7: PIN_20,
    },
    proximity: ProximityResources {
        adc: ADC,
        front_right: PIN_26,
        right: PIN_27,
        left: PIN_28,
        front_left: PIN_29,
    }
}

// also bind interrupts
use embassy_rp::adc::InterruptHandler as AdcInterruptHandler;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::BufferedInterruptHandler;

bind_interrupts!(pub struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});
