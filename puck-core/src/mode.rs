//! Operating mode, read from the program selector

/// Decoded selector position
///
/// Bit 0 enables driving, bit 1 enables image capture and streaming. Position 0 keeps
/// the robot parked before the control loop starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mode(u8);

impl Mode {
    pub const MOTION: u8 = 1;
    pub const SENSING: u8 = 2;

    pub const fn from_selector(position: u8) -> Self {
        Self(position)
    }

    pub fn selector(&self) -> u8 {
        self.0
    }

    pub fn motion(&self) -> bool {
        self.0 & Self::MOTION != 0
    }

    pub fn sensing(&self) -> bool {
        self.0 & Self::SENSING != 0
    }

    pub fn is_parked(&self) -> bool {
        self.0 == 0
    }
}

/// Source of the mode, sampled once per tick
pub trait ModeGate {
    fn sample(&mut self) -> Mode;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_bits() {
        let parked = Mode::from_selector(0);
        assert!(parked.is_parked());
        assert!(!parked.motion() && !parked.sensing());

        let motion = Mode::from_selector(1);
        assert!(motion.motion() && !motion.sensing());

        let sensing = Mode::from_selector(2);
        assert!(!sensing.motion() && sensing.sensing());

        let both = Mode::from_selector(3);
        assert!(both.motion() && both.sensing());
    }

    #[test]
    fn test_unused_positions_are_not_parked() {
        // Position 4 sets neither bit but still releases the start-up wait
        let mode = Mode::from_selector(4);
        assert!(!mode.is_parked());
        assert!(!mode.motion() && !mode.sensing());
    }
}
