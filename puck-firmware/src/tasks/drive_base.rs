//! Differential drive behind a DRV8833
//!
//! The control loop posts wheel speeds through [`SignalDrive`]; this task applies the
//! latest one and sleeps the driver while both wheels are stopped.

use defmt::{debug, error, info, unwrap};
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::pwm::{self, Pwm};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use puck_core::Drive;

use self::drv8833::{DRV8833Driver, MotorChannel, MotorDriverError};
use super::DriveBaseResources;

mod drv8833;

/// Wheel speed, in steps per second, that maps to full duty
const MAX_SPEED: i32 = 1000;

/// Left and right wheel speed
static DRIVE_SPEEDS: Signal<CriticalSectionRawMutex, (i16, i16)> = Signal::new();

fn duty_percent(speed: i16) -> i8 {
    (speed as i32 * 100 / MAX_SPEED).clamp(-100, 100) as i8
}

#[embassy_executor::task]
async fn drive_base_task(r: DriveBaseResources) -> ! {
    let mut config = pwm::Config::default();
    // 25 kHz at the 150 MHz system clock, out of the audible range
    config.top = 5999;

    let (left_a, left_b) = Pwm::new_output_ab(r.left_slice, r.left_a, r.left_b, config.clone()).split();
    let (right_a, right_b) = Pwm::new_output_ab(r.right_slice, r.right_a, r.right_b, config).split();
    let sleep = Output::new(r.sleep, Level::Low);

    let mut driver = DRV8833Driver::new(
        unwrap!(left_a),
        unwrap!(left_b),
        unwrap!(right_a),
        unwrap!(right_b),
        sleep,
    );

    loop {
        let (left, right) = DRIVE_SPEEDS.wait().await;
        debug!("drive: left {} right {}", left, right);
        if let Err(e) = apply(&mut driver, left, right) {
            error!("drive: {:?}", e);
        }
    }
}

fn apply<T, O>(driver: &mut DRV8833Driver<T, O>, left: i16, right: i16) -> Result<(), MotorDriverError>
where
    T: embedded_hal::pwm::SetDutyCycle,
    O: embedded_hal::digital::OutputPin,
{
    if left == 0 && right == 0 {
        driver.set(MotorChannel::ChannelA, 0)?;
        driver.set(MotorChannel::ChannelB, 0)?;
        return driver.sleep();
    }

    driver.wakeup()?;
    driver.set(MotorChannel::ChannelA, duty_percent(left))?;
    driver.set(MotorChannel::ChannelB, duty_percent(right))
}

/// Hands wheel speeds to the drive task without waiting
pub struct SignalDrive;

impl Drive for SignalDrive {
    fn set_speeds(&mut self, left: i16, right: i16) {
        DRIVE_SPEEDS.signal((left, right));
    }
}

pub async fn init(spawner: Spawner, r: DriveBaseResources) {
    unwrap!(spawner.spawn(drive_base_task(r)));
    info!("drive: ready");
}
