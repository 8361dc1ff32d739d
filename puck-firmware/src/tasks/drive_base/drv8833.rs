// Adapted from https://github.com/milewski/drv8833-driver, which requires std :(

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

#[derive(Debug, defmt::Format)]
pub enum MotorDriverError {
    /// Returned when fail to set pin low/high.
    GpioError,
    /// Returned when fail to set duty value.
    UnableToSetDuty,
}

/// One H-bridge, driven by a PWM output on each input
struct Bridge<T: SetDutyCycle> {
    in1: T,
    in2: T,
}

impl<T: SetDutyCycle> Bridge<T> {
    /// Signed duty in percent, positive drives `in1`
    fn drive(&mut self, percent: i8) -> Result<(), MotorDriverError> {
        let (on, off) = if percent >= 0 {
            (&mut self.in1, &mut self.in2)
        } else {
            (&mut self.in2, &mut self.in1)
        };

        off.set_duty_cycle_fully_off()
            .map_err(|_| MotorDriverError::UnableToSetDuty)?;
        on.set_duty_cycle_percent(percent.unsigned_abs().min(100))
            .map_err(|_| MotorDriverError::UnableToSetDuty)
    }

    /// Short the motor for a hard stop
    fn brake(&mut self) -> Result<(), MotorDriverError> {
        self.in1
            .set_duty_cycle_fully_on()
            .map_err(|_| MotorDriverError::UnableToSetDuty)?;
        self.in2
            .set_duty_cycle_fully_on()
            .map_err(|_| MotorDriverError::UnableToSetDuty)
    }
}

pub enum MotorChannel {
    ChannelA,
    ChannelB,
}

pub struct DRV8833Driver<T: SetDutyCycle, O: OutputPin> {
    a: Bridge<T>,
    b: Bridge<T>,
    sleep: O,
}

impl<T: SetDutyCycle, O: OutputPin> DRV8833Driver<T, O> {
    pub fn new(a1: T, a2: T, b1: T, b2: T, sleep: O) -> Self {
        Self {
            a: Bridge { in1: a1, in2: a2 },
            b: Bridge { in1: b1, in2: b2 },
            sleep,
        }
    }

    /// Puts the device into a low power sleep state with the H-bridges disabled.
    /// All inputs are ignored until [`DRV8833Driver::wakeup`] is called.
    pub fn sleep(&mut self) -> Result<(), MotorDriverError> {
        self.sleep.set_low().map_err(|_| MotorDriverError::GpioError)
    }

    pub fn wakeup(&mut self) -> Result<(), MotorDriverError> {
        self.sleep.set_high().map_err(|_| MotorDriverError::GpioError)
    }

    /// Signed duty cycle in percent, zero brakes
    pub fn set(&mut self, channel: MotorChannel, percent: i8) -> Result<(), MotorDriverError> {
        let bridge = match channel {
            MotorChannel::ChannelA => &mut self.a,
            MotorChannel::ChannelB => &mut self.b,
        };

        if percent == 0 { bridge.brake() } else { bridge.drive(percent) }
    }
}
