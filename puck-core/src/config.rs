//! Static robot configuration
//!
//! Supplied once before the [`crate::Puck`] is built and never changed afterwards.
//! The defaults are the values the robot was tuned with.

use puck_messages::{Ack, ConfigPayload};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of the camera's pixel array
pub const SENSOR_WIDTH: u16 = 640;
/// Height of the camera's pixel array
pub const SENSOR_HEIGHT: u16 = 480;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("image has zero area")]
    EmptyImage,
    #[error("image of {size} bytes does not fit a {capacity} byte buffer")]
    ImageTooLarge { size: usize, capacity: usize },
    #[error("sub-sampling ratio must be at least 1")]
    ZeroSubsampling,
    #[error("capture window of {width}x{height} pixels exceeds the sensor")]
    WindowOutOfBounds { width: u32, height: u32 },
}

/// Which parts of the control loop run
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Modules {
    /// Read the proximity ring and light the LED facing the closest obstacle
    pub proximity: bool,
    /// Drive with obstacle avoidance
    pub motion: bool,
    /// Stream images to the host
    pub transmission: bool,
    /// Fill image buffers from the imager
    pub capture: bool,
}

impl Default for Modules {
    fn default() -> Self {
        Self {
            proximity: true,
            motion: true,
            transmission: true,
            capture: true,
        }
    }
}

/// Area of interest, in delivered (sub-sampled) pixels
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImageConfig {
    pub width: u16,
    pub height: u16,
    pub subsampling: u16,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 25,
            subsampling: 8,
        }
    }
}

/// Region of the pixel array the camera reads out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureWindow {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub subsampling: u16,
}

impl ImageConfig {
    /// Bytes per image, one byte per grey-scale pixel
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn payload(&self) -> ConfigPayload {
        ConfigPayload {
            cols: self.width as u32,
            rows: self.height as u32,
        }
    }

    /// Sensor region centred on the array that sub-samples down to this image
    ///
    /// This is what a camera driver programs into the sensor's readout registers. The
    /// synthetic imager has no sensor, so the firmware only reports it at startup.
    pub fn window(&self) -> Result<CaptureWindow, ConfigError> {
        if self.subsampling == 0 {
            return Err(ConfigError::ZeroSubsampling);
        }

        let width = self.width as u32 * self.subsampling as u32;
        let height = self.height as u32 * self.subsampling as u32;
        if width > SENSOR_WIDTH as u32 || height > SENSOR_HEIGHT as u32 {
            return Err(ConfigError::WindowOutOfBounds { width, height });
        }

        Ok(CaptureWindow {
            x: ((SENSOR_WIDTH as u32 - width) / 2) as u16,
            y: ((SENSOR_HEIGHT as u32 - height) / 2) as u16,
            width: width as u16,
            height: height as u16,
            subsampling: self.subsampling,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionConfig {
    /// Wheel speed while driving straight
    pub moving_speed: i16,
    /// Wheel speed while turning on the spot
    pub turning_speed: i16,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            moving_speed: 200,
            turning_speed: 50,
        }
    }
}

/// Proximity readings above these count as an obstacle
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObstacleThresholds {
    /// Front and front-diagonal sensors
    pub front: u16,
    /// Side sensors, which see the wall the robot drives along
    pub side: u16,
}

impl Default for ObstacleThresholds {
    fn default() -> Self {
        Self {
            front: 300,
            side: 1500,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PuckConfig {
    pub modules: Modules,
    pub image: ImageConfig,
    pub motion: MotionConfig,
    pub obstacle: ObstacleThresholds,
    pub ack: Ack,
}

impl PuckConfig {
    /// Check the configuration against a pool of `N` byte buffers
    pub fn validate<const N: usize>(&self) -> Result<(), ConfigError> {
        if self.image.is_empty() {
            return Err(ConfigError::EmptyImage);
        }
        if self.image.len() > N {
            return Err(ConfigError::ImageTooLarge {
                size: self.image.len(),
                capacity: N,
            });
        }
        self.image.window().map(|_| ())
    }
}
