#![no_std]

//! Control logic for the puck
//!
//! Everything here is polled. One call to [`Puck::tick`] steps every state machine
//! exactly once and never blocks; hardware waits are expressed as states that are
//! re-checked on the next tick. The device specific parts (serial port, camera,
//! proximity ring, motors, LEDs) are reached through the traits in this crate so the
//! same logic runs on the robot and in host tests.

#[cfg(test)]
extern crate std;

// This must go first so the macros are visible to the rest of the crate.
#[macro_use]
mod fmt;

pub mod capture;
pub mod channel;
pub mod config;
pub mod mode;
pub mod motion;
pub mod pool;
pub mod puck;
pub mod transmission;

#[cfg(test)]
mod testing;

pub use capture::{CaptureFsm, CaptureState, Imager, SyntheticImager};
pub use channel::Channel;
pub use config::{
    CaptureWindow, ConfigError, ImageConfig, Modules, MotionConfig, ObstacleThresholds, PuckConfig,
};
pub use mode::{Mode, ModeGate};
pub use motion::{Drive, Indicator, MotionFsm, MotionState, Proximity, ProximityFrame};
pub use pool::{BufferPool, SLOTS};
pub use puck::{Puck, PuckIo};
pub use transmission::{TransmissionFsm, TxState};
