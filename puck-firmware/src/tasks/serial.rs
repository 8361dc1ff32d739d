//! UART link to the host
//!
//! Two tasks move bytes between the UART and a pair of pipes. The control loop only
//! touches the pipes through [`SerialChannel`], which never waits.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{error, info, unwrap};
use embassy_executor::Spawner;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedUart, BufferedUartRx, BufferedUartTx, Config, DataBits, Parity, StopBits};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embedded_io_async::{Read, Write};
use puck_core::Channel;
use static_cell::StaticCell;

use super::{IMAGE_CAPACITY, Irqs, SerialResources};

// A whole image has to fit so one send is never split across ticks
static PUCK_TO_HOST: Pipe<CriticalSectionRawMutex, IMAGE_CAPACITY> = Pipe::new();
static HOST_TO_PUCK: Pipe<CriticalSectionRawMutex, 64> = Pipe::new();

/// Set from the moment a send is queued until its last byte has left the UART
static TX_ACTIVE: AtomicBool = AtomicBool::new(false);

#[embassy_executor::task]
async fn serial_tx_task(mut tx: BufferedUartTx<'static, UART0>) -> ! {
    let mut buf = [0; 64];
    loop {
        let n = PUCK_TO_HOST.read(&mut buf).await;
        if let Err(e) = tx.write_all(&buf[..n]).await {
            error!("serial: write failed: {:?}", e);
        }
        if PUCK_TO_HOST.is_empty() {
            if let Err(e) = tx.flush().await {
                error!("serial: flush failed: {:?}", e);
            }
            // More may have been queued while flushing
            if PUCK_TO_HOST.is_empty() {
                TX_ACTIVE.store(false, Ordering::Release);
            }
        }
    }
}

#[embassy_executor::task]
async fn serial_rx_task(mut rx: BufferedUartRx<'static, UART0>) -> ! {
    let mut buf = [0; 16];
    loop {
        match rx.read(&mut buf).await {
            Ok(n) => HOST_TO_PUCK.write_all(&buf[..n]).await,
            Err(e) => error!("serial: read failed: {:?}", e),
        }
    }
}

/// Non-blocking view of the UART for the control loop
pub struct SerialChannel;

impl Channel for SerialChannel {
    fn send(&mut self, bytes: &[u8]) {
        TX_ACTIVE.store(true, Ordering::Release);
        match PUCK_TO_HOST.try_write(bytes) {
            Ok(n) if n == bytes.len() => {}
            Ok(n) => error!("serial: dropped {} of {} bytes", bytes.len() - n, bytes.len()),
            Err(_) => error!("serial: pipe full, dropped {} bytes", bytes.len()),
        }
    }

    fn is_sending(&self) -> bool {
        TX_ACTIVE.load(Ordering::Acquire) || !PUCK_TO_HOST.is_empty()
    }

    fn has_byte(&self) -> bool {
        !HOST_TO_PUCK.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0];
        match HOST_TO_PUCK.try_read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

pub async fn init(spawner: Spawner, r: SerialResources) {
    let mut config = Config::default();
    config.baudrate = 115200;
    config.stop_bits = StopBits::STOP1;
    config.data_bits = DataBits::DataBits8;
    config.parity = Parity::ParityNone;

    static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
    let tx_buf = &mut TX_BUF.init([0; 256])[..];
    static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
    let rx_buf = &mut RX_BUF.init([0; 64])[..];
    let uart = BufferedUart::new(r.uart, r.tx, r.rx, Irqs, tx_buf, rx_buf, config);
    let (tx, rx) = uart.split();

    unwrap!(spawner.spawn(serial_tx_task(tx)));
    unwrap!(spawner.spawn(serial_rx_task(rx)));
    info!("serial: up at {} baud", config.baudrate);
}
