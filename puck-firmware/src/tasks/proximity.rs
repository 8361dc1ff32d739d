//! Infrared proximity ring
//!
//! The board has four analog sensors. They are published at the ring positions the
//! obstacle logic looks at, the remaining positions always read zero.

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config};
use embassy_rp::gpio::Pull;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::watch::{Receiver, Watch};
use embassy_time::Timer;
use puck_core::{Proximity, ProximityFrame};

use super::{Irqs, ProximityResources};

/// Ring index of each ADC channel, in the order they are sampled
const RING_POSITIONS: [usize; 4] = [0, 2, 5, 7];

static PROXIMITY_WATCH: Watch<CriticalSectionRawMutex, ProximityFrame, 1> = Watch::new();

#[embassy_executor::task]
async fn proximity_task(r: ProximityResources) -> ! {
    let mut adc = Adc::new(r.adc, Irqs, Config::default());
    let mut channels = [
        Channel::new_pin(r.front_right, Pull::None),
        Channel::new_pin(r.right, Pull::None),
        Channel::new_pin(r.left, Pull::None),
        Channel::new_pin(r.front_left, Pull::None),
    ];

    let sender = PROXIMITY_WATCH.sender();

    loop {
        let mut frame = ProximityFrame::default();
        for (channel, &position) in channels.iter_mut().zip(RING_POSITIONS.iter()) {
            match adc.read(channel).await {
                Ok(reading) => frame.0[position] = reading,
                Err(e) => warn!("proximity: sensor {} failed: {:?}", position, e),
            }
        }
        sender.send(frame);

        Timer::after_millis(20).await;
    }
}

/// Latest ring reading, all zero until the first one arrives
pub struct WatchedProximity {
    receiver: Receiver<'static, CriticalSectionRawMutex, ProximityFrame, 1>,
}

impl WatchedProximity {
    pub fn new() -> Self {
        Self {
            receiver: unwrap!(PROXIMITY_WATCH.receiver()),
        }
    }
}

impl Proximity for WatchedProximity {
    fn read(&mut self) -> ProximityFrame {
        self.receiver.try_get().unwrap_or_default()
    }
}

pub async fn init(spawner: Spawner, r: ProximityResources) {
    unwrap!(spawner.spawn(proximity_task(r)));
    info!("proximity: sampling");
}
