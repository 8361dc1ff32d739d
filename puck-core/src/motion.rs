//! Obstacle avoidance driving
//!
//! Drive straight until the proximity ring sees something, then turn on the spot away
//! from it until that side is clear again.

use crate::config::{MotionConfig, ObstacleThresholds};

pub const PROXIMITY_SENSORS: usize = 8;

/// One reading of the proximity ring
///
/// Index 0 looks forward and slightly right, indices increase clockwise seen from above,
/// so 2 faces right, 5 faces left and 7 looks forward and slightly left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProximityFrame(pub [u16; PROXIMITY_SENSORS]);

impl ProximityFrame {
    pub fn obstructed_right(&self, thresholds: &ObstacleThresholds) -> bool {
        let p = &self.0;
        p[0] > thresholds.front || p[1] > thresholds.front || p[2] > thresholds.side
    }

    pub fn obstructed_left(&self, thresholds: &ObstacleThresholds) -> bool {
        let p = &self.0;
        p[7] > thresholds.front || p[6] > thresholds.front || p[5] > thresholds.side
    }

    /// Sensor with the strongest reading, `None` if the ring sees nothing at all
    pub fn closest(&self) -> Option<usize> {
        let mut closest = None;
        let mut strongest = 0;
        for (index, &reading) in self.0.iter().enumerate() {
            if reading > strongest {
                strongest = reading;
                closest = Some(index);
            }
        }
        closest
    }
}

pub trait Proximity {
    fn read(&mut self) -> ProximityFrame;
}

/// Differential drive, speeds are signed wheel steps per second
pub trait Drive {
    fn set_speeds(&mut self, left: i16, right: i16);
}

/// Ring of LEDs matching the proximity sensors
pub trait Indicator {
    /// Light only the LED facing `sensor`, or none
    fn show_closest(&mut self, sensor: Option<usize>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    Init,
    Forwards,
    TurnLeft,
    TurnRight,
    Stop,
}

pub struct MotionFsm {
    state: MotionState,
    config: MotionConfig,
    thresholds: ObstacleThresholds,
}

impl MotionFsm {
    pub fn new(config: MotionConfig, thresholds: ObstacleThresholds) -> Self {
        Self {
            state: MotionState::Init,
            config,
            thresholds,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn step<D>(&mut self, enabled: bool, frame: &ProximityFrame, drive: &mut D) -> MotionState
    where
        D: Drive + ?Sized,
    {
        let forward = self.config.moving_speed;
        let turn = self.config.turning_speed;

        let next = match self.state {
            MotionState::Stop if enabled => MotionState::Init,
            MotionState::Stop => MotionState::Stop,
            _ if !enabled => {
                drive.set_speeds(0, 0);
                MotionState::Stop
            }
            MotionState::Init => {
                drive.set_speeds(forward, forward);
                MotionState::Forwards
            }
            MotionState::Forwards => {
                if frame.obstructed_right(&self.thresholds) {
                    drive.set_speeds(-turn, turn);
                    MotionState::TurnLeft
                } else if frame.obstructed_left(&self.thresholds) {
                    drive.set_speeds(turn, -turn);
                    MotionState::TurnRight
                } else {
                    MotionState::Forwards
                }
            }
            MotionState::TurnLeft => {
                if frame.obstructed_right(&self.thresholds) {
                    MotionState::TurnLeft
                } else {
                    drive.set_speeds(forward, forward);
                    MotionState::Forwards
                }
            }
            MotionState::TurnRight => {
                if frame.obstructed_left(&self.thresholds) {
                    MotionState::TurnRight
                } else {
                    drive.set_speeds(forward, forward);
                    MotionState::Forwards
                }
            }
        };

        if next != self.state {
            debug!("motion: {} -> {}", self.state, next);
        }
        self.state = next;
        next
    }
}
