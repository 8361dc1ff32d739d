//! The control loop
//!
//! Waits for the selector to leave position 0, then ticks the puck every 100 ms.

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::{Duration, Ticker, Timer};
use puck_core::{Indicator, Mode, ModeGate, Puck, PuckConfig, PuckIo, SyntheticImager};
use static_cell::StaticCell;

use super::drive_base::SignalDrive;
use super::proximity::WatchedProximity;
use super::serial::SerialChannel;
use super::{IMAGE_CAPACITY, LedRingResources, SelectorResources};

/// Four bit rotary selector, pulled up, a closed contact reads low
struct SelectorSwitch {
    bits: [Input<'static>; 4],
}

impl ModeGate for SelectorSwitch {
    fn sample(&mut self) -> Mode {
        let position = self
            .bits
            .iter()
            .enumerate()
            .fold(0, |acc, (bit, input)| acc | ((input.is_low() as u8) << bit));
        Mode::from_selector(position)
    }
}

/// One LED per proximity sensor
struct LedRing {
    leds: [Output<'static>; 8],
}

impl Indicator for LedRing {
    fn show_closest(&mut self, sensor: Option<usize>) {
        for (index, led) in self.leds.iter_mut().enumerate() {
            led.set_level(if Some(index) == sensor { Level::High } else { Level::Low });
        }
    }
}

#[embassy_executor::task]
async fn control_task(mut selector: SelectorSwitch, mut leds: LedRing) -> ! {
    static PUCK: StaticCell<Puck<IMAGE_CAPACITY>> = StaticCell::new();
    let puck = PUCK.init(unwrap!(Puck::new(PuckConfig::default())));
    info!("control: configured with {}", puck.config());
    info!("control: capture window {}", unwrap!(puck.config().image.window()));

    // Let the sensors settle
    Timer::after_millis(500).await;

    while selector.sample().is_parked() {
        Timer::after_millis(500).await;
    }
    info!("control: starting");

    let mut channel = SerialChannel;
    let mut imager = SyntheticImager::new();
    let mut proximity = WatchedProximity::new();
    let mut drive = SignalDrive;

    let mut ticker = Ticker::every(Duration::from_millis(100));
    loop {
        let mode = selector.sample();
        let mut io = PuckIo {
            channel: &mut channel,
            imager: &mut imager,
            proximity: &mut proximity,
            drive: &mut drive,
            indicator: &mut leds,
        };
        puck.tick(mode, &mut io);

        ticker.next().await;
    }
}

pub async fn init(spawner: Spawner, selector_r: SelectorResources, leds_r: LedRingResources) {
    let selector = SelectorSwitch {
        bits: [
            Input::new(selector_r.bit0, Pull::Up),
            Input::new(selector_r.bit1, Pull::Up),
            Input::new(selector_r.bit2, Pull::Up),
            Input::new(selector_r.bit3, Pull::Up),
        ],
    };

    let leds = LedRing {
        leds: [
            Output::new(leds_r.led0, Level::Low),
            Output::new(leds_r.led1, Level::Low),
            Output::new(leds_r.led2, Level::Low),
            Output::new(leds_r.led3, Level::Low),
            Output::new(leds_r.led4, Level::Low),
            Output::new(leds_r.led5, Level::Low),
            Output::new(leds_r.led6, Level::Low),
            Output::new(leds_r.led7, Level::Low),
        ],
    };

    unwrap!(spawner.spawn(control_task(selector, leds)));
}
