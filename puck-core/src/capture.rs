//! Image capture: the producer side of the buffer pool

use crate::pool::BufferPool;

/// Camera seam
///
/// A capture is started with `start_capture` and then polled once per tick. The target
/// slot is lent to the imager on every poll, so a driver may fill it incrementally.
pub trait Imager {
    fn start_capture(&mut self);

    /// Advance the running capture into `target`, `true` once the frame is complete
    fn poll_capture(&mut self, target: &mut [u8]) -> bool;

    /// Drop a running capture. Whatever was written so far is left in place.
    fn abort(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureState {
    Inactive,
    Idle,
    Capturing { target: usize },
}

pub struct CaptureFsm {
    state: CaptureState,
    starved: bool,
}

impl Default for CaptureFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureFsm {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Inactive,
            starved: false,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Idle because both slots still hold untransmitted images
    pub fn is_starved(&self) -> bool {
        self.starved
    }

    pub fn step<const N: usize, I>(&mut self, sensing: bool, pool: &mut BufferPool<N>, imager: &mut I) -> CaptureState
    where
        I: Imager + ?Sized,
    {
        let next = match self.state {
            state if !sensing => {
                if let CaptureState::Capturing { target } = state {
                    debug!("capture: abandoning slot {}", target);
                    imager.abort();
                }
                CaptureState::Inactive
            }
            CaptureState::Inactive => CaptureState::Idle,
            CaptureState::Idle => match pool.first_free() {
                Some(target) => {
                    imager.start_capture();
                    CaptureState::Capturing { target }
                }
                None => CaptureState::Idle,
            },
            CaptureState::Capturing { target } => {
                if imager.poll_capture(pool.data_mut(target)) {
                    pool.mark_ready(target);
                    CaptureState::Idle
                } else {
                    CaptureState::Capturing { target }
                }
            }
        };

        let starved = next == CaptureState::Idle && pool.first_free().is_none();
        if starved && !self.starved {
            warn!("capture: no free image buffer, waiting for transmission");
        }
        self.starved = starved;
        if next != self.state {
            debug!("capture: {} -> {}", self.state, next);
        }
        self.state = next;
        next
    }
}

/// Stand-in for a camera: every frame is the byte ramp 0, 1, .. 255, 0, ..
///
/// A frame completes on the first poll after it was started.
#[derive(Debug, Default)]
pub struct SyntheticImager {
    running: bool,
}

impl SyntheticImager {
    pub fn new() -> Self {
        Self { running: false }
    }
}

impl Imager for SyntheticImager {
    fn start_capture(&mut self) {
        self.running = true;
    }

    fn poll_capture(&mut self, target: &mut [u8]) -> bool {
        if !self.running {
            return false;
        }
        for (i, byte) in target.iter_mut().enumerate() {
            *byte = i as u8;
        }
        self.running = false;
        true
    }

    fn abort(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::testing::MockImager;

    fn enabled_capture() -> CaptureFsm {
        let mut capture = CaptureFsm::new();
        capture.state = CaptureState::Idle;
        capture
    }

    #[test]
    fn test_enable_goes_idle_then_captures_slot_zero() -> Result<(), ConfigError> {
        let mut pool = BufferPool::<4>::new(4)?;
        let mut imager = MockImager::new();
        let mut capture = CaptureFsm::new();

        assert_eq!(capture.step(false, &mut pool, &mut imager), CaptureState::Inactive);
        assert_eq!(capture.step(true, &mut pool, &mut imager), CaptureState::Idle);
        assert_eq!(
            capture.step(true, &mut pool, &mut imager),
            CaptureState::Capturing { target: 0 }
        );
        assert_eq!(imager.starts, 1);
        Ok(())
    }

    #[test]
    fn test_completion_marks_ready() -> Result<(), ConfigError> {
        let mut pool = BufferPool::<4>::new(4)?;
        let mut imager = MockImager::new();
        let mut capture = enabled_capture();

        capture.step(true, &mut pool, &mut imager);
        assert_eq!(
            capture.step(true, &mut pool, &mut imager),
            CaptureState::Capturing { target: 0 }
        );
        assert!(!pool.is_ready(0));

        imager.frame_ready = true;
        assert_eq!(capture.step(true, &mut pool, &mut imager), CaptureState::Idle);
        assert!(pool.is_ready(0));
        assert_eq!(pool.data(0), &[1, 1, 1, 1]);
        Ok(())
    }

    #[test]
    fn test_backpressure_holds_idle() -> Result<(), ConfigError> {
        let mut pool = BufferPool::<4>::new(4)?;
        let mut imager = MockImager::new();
        imager.frame_ready = true;
        let mut capture = enabled_capture();

        // Fill slot 0, then slot 1
        for _ in 0..4 {
            capture.step(true, &mut pool, &mut imager);
        }
        assert!(pool.is_ready(0) && pool.is_ready(1));
        assert!(capture.is_starved());

        for _ in 0..5 {
            assert_eq!(capture.step(true, &mut pool, &mut imager), CaptureState::Idle);
        }
        assert_eq!(imager.starts, 2);

        // Transmission frees slot 0 and capture picks it up again
        pool.release(0);
        assert_eq!(
            capture.step(true, &mut pool, &mut imager),
            CaptureState::Capturing { target: 0 }
        );
        assert!(!capture.is_starved());
        Ok(())
    }

    #[test]
    fn test_disable_abandons_capture() -> Result<(), ConfigError> {
        let mut pool = BufferPool::<4>::new(4)?;
        let mut imager = MockImager::new();
        let mut capture = enabled_capture();

        capture.step(true, &mut pool, &mut imager);
        assert_eq!(capture.step(false, &mut pool, &mut imager), CaptureState::Inactive);
        assert_eq!(imager.aborts, 1);
        assert!(!pool.is_ready(0));

        // A completion reported after the disable is never observed
        imager.frame_ready = true;
        assert_eq!(capture.step(false, &mut pool, &mut imager), CaptureState::Inactive);
        assert!(!pool.is_ready(0));
        Ok(())
    }

    #[test]
    fn test_synthetic_imager_ramp() {
        let mut imager = SyntheticImager::new();
        let mut frame = [0xFFu8; 300];

        assert!(!imager.poll_capture(&mut frame));
        imager.start_capture();
        assert!(imager.poll_capture(&mut frame));
        assert_eq!(frame[0], 0);
        assert_eq!(frame[255], 255);
        assert_eq!(frame[256], 0);
        assert_eq!(frame[299], 43);
        assert!(!imager.poll_capture(&mut frame));
    }
}
