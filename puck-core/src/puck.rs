//! One control loop pass over every state machine

use crate::capture::{CaptureFsm, CaptureState, Imager};
use crate::channel::Channel;
use crate::config::{ConfigError, PuckConfig};
use crate::mode::Mode;
use crate::motion::{Drive, Indicator, MotionFsm, MotionState, Proximity, ProximityFrame};
use crate::pool::BufferPool;
use crate::transmission::{TransmissionFsm, TxState};

/// The devices a tick talks to
pub struct PuckIo<'a> {
    pub channel: &'a mut dyn Channel,
    pub imager: &'a mut dyn Imager,
    pub proximity: &'a mut dyn Proximity,
    pub drive: &'a mut dyn Drive,
    pub indicator: &'a mut dyn Indicator,
}

/// The robot's control logic with image buffers of `N` bytes
pub struct Puck<const N: usize> {
    config: PuckConfig,
    pool: BufferPool<N>,
    capture: CaptureFsm,
    transmission: TransmissionFsm,
    motion: MotionFsm,
    proximity: ProximityFrame,
    mode: Option<Mode>,
}

impl<const N: usize> Puck<N> {
    pub fn new(config: PuckConfig) -> Result<Self, ConfigError> {
        config.validate::<N>()?;

        Ok(Self {
            pool: BufferPool::new(config.image.len())?,
            capture: CaptureFsm::new(),
            transmission: TransmissionFsm::new(config.image.payload(), config.ack),
            motion: MotionFsm::new(config.motion, config.obstacle),
            proximity: ProximityFrame::default(),
            mode: None,
            config,
        })
    }

    /// Step every enabled module once, in the order proximity, motion, transmission, capture
    pub fn tick(&mut self, mode: Mode, io: &mut PuckIo<'_>) {
        if self.mode != Some(mode) {
            info!(
                "mode: selector {} (motion: {}, sensing: {})",
                mode.selector(),
                mode.motion(),
                mode.sensing()
            );
            self.mode = Some(mode);
        }

        let modules = self.config.modules;

        if modules.proximity {
            self.proximity = io.proximity.read();
            io.indicator.show_closest(self.proximity.closest());
        }

        if modules.motion {
            self.motion.step(mode.motion(), &self.proximity, &mut *io.drive);
        }

        if modules.transmission {
            self.transmission
                .step(mode.sensing(), &mut self.pool, &mut *io.channel);
        }

        if modules.capture {
            self.capture.step(mode.sensing(), &mut self.pool, &mut *io.imager);
        }
    }

    pub fn config(&self) -> &PuckConfig {
        &self.config
    }

    pub fn pool(&self) -> &BufferPool<N> {
        &self.pool
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    /// Capture is waiting for transmission to free a slot
    pub fn is_starved(&self) -> bool {
        self.capture.is_starved()
    }

    pub fn tx_state(&self) -> TxState {
        self.transmission.state()
    }

    pub fn motion_state(&self) -> MotionState {
        self.motion.state()
    }

    /// Last proximity reading, all zero while the proximity module is off
    pub fn proximity(&self) -> &ProximityFrame {
        &self.proximity
    }
}

#[cfg(test)]
mod tests {
    use std::vec;

    use puck_messages::{ACK, MessageHeader};

    use super::*;
    use crate::config::ImageConfig;
    use crate::testing::{MockChannel, MockDrive, MockImager, MockIndicator, MockProximity};

    const PARKED: Mode = Mode::from_selector(0);
    const MOTION: Mode = Mode::from_selector(Mode::MOTION);
    const SENSING: Mode = Mode::from_selector(Mode::SENSING);

    #[derive(Default)]
    struct Rig {
        channel: MockChannel,
        imager: MockImager,
        proximity: MockProximity,
        drive: MockDrive,
        indicator: MockIndicator,
    }

    impl Rig {
        fn tick<const N: usize>(&mut self, puck: &mut Puck<N>, mode: Mode) {
            let mut io = PuckIo {
                channel: &mut self.channel,
                imager: &mut self.imager,
                proximity: &mut self.proximity,
                drive: &mut self.drive,
                indicator: &mut self.indicator,
            };
            puck.tick(mode, &mut io);
        }
    }

    /// 2x2 images so the pool fits in four bytes
    fn small_config() -> PuckConfig {
        PuckConfig {
            image: ImageConfig {
                width: 2,
                height: 2,
                subsampling: 8,
            },
            ..Default::default()
        }
    }

    /// Tick until the configuration exchange is through
    fn configured(rig: &mut Rig) -> Result<Puck<4>, ConfigError> {
        let mut puck = Puck::<4>::new(small_config())?;
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        rig.channel.inject(&[ACK]);
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        assert_eq!(puck.tx_state(), TxState::ScanVisual);
        rig.channel.take_sent();
        Ok(puck)
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            Puck::<1024>::new(PuckConfig::default()),
            Err(ConfigError::ImageTooLarge { size: 1600, capacity: 1024 })
        ));
    }

    #[test]
    fn test_config_handshake_bytes() -> Result<(), ConfigError> {
        let mut rig = Rig::default();
        let mut puck = Puck::<1600>::new(PuckConfig::default())?;

        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        assert_eq!(puck.tx_state(), TxState::AwaitConfigAck);
        assert_eq!(rig.channel.take_sent(), vec![vec![1, 0, 0, 0, 8, 0, 0, 0]]);

        rig.channel.inject(&[ACK]);
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        assert_eq!(puck.tx_state(), TxState::ScanVisual);
        assert_eq!(rig.channel.take_sent(), vec![vec![64, 0, 0, 0, 25, 0, 0, 0]]);
        Ok(())
    }

    #[test]
    fn test_backpressure_until_transmission_frees_slot() -> Result<(), ConfigError> {
        let mut rig = Rig::default();
        rig.imager.frame_ready = true;
        let mut puck = Puck::<4>::new(small_config())?;

        // The host never answers, both slots fill and capture holds
        for _ in 0..5 {
            rig.tick(&mut puck, SENSING);
        }
        assert!(puck.pool().is_ready(0) && puck.pool().is_ready(1));
        for _ in 0..5 {
            rig.tick(&mut puck, SENSING);
            assert_eq!(puck.capture_state(), CaptureState::Idle);
            assert!(puck.is_starved());
        }
        assert_eq!(puck.tx_state(), TxState::AwaitConfigAck);

        rig.channel.inject(&[ACK]);
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        assert_eq!(puck.tx_state(), TxState::AwaitVisualAck { target: 0 });

        rig.channel.inject(&[ACK]);
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        assert_eq!(puck.tx_state(), TxState::AwaitSendComplete { target: 0 });
        assert!(puck.is_starved());

        // Freed and refilled within the same tick
        rig.tick(&mut puck, SENSING);
        assert_eq!(puck.tx_state(), TxState::ScanVisual);
        assert_eq!(puck.capture_state(), CaptureState::Capturing { target: 0 });
        assert!(!puck.is_starved());
        Ok(())
    }

    #[test]
    fn test_disable_mid_send_resends_stale_image() -> Result<(), ConfigError> {
        let mut rig = Rig::default();
        let mut puck = configured(&mut rig)?;

        rig.imager.frame_ready = true;
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        assert!(puck.pool().is_ready(0));
        rig.imager.frame_ready = false;

        rig.tick(&mut puck, SENSING);
        assert_eq!(puck.tx_state(), TxState::AwaitVisualAck { target: 0 });

        rig.tick(&mut puck, PARKED);
        assert_eq!(puck.tx_state(), TxState::Init);
        assert_eq!(puck.capture_state(), CaptureState::Inactive);
        assert!(puck.pool().is_ready(0));

        // Same handshake again, then the image from before the disable
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        rig.channel.inject(&[ACK]);
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        assert_eq!(puck.tx_state(), TxState::AwaitVisualAck { target: 0 });
        rig.channel.inject(&[ACK]);
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);

        let sent = rig.channel.take_sent();
        assert_eq!(sent.last().unwrap(), &vec![1, 1, 1, 1]);
        Ok(())
    }

    #[test]
    fn test_visual_header_announces_image_length() -> Result<(), ConfigError> {
        let mut rig = Rig::default();
        let mut puck = configured(&mut rig)?;

        rig.imager.frame_ready = true;
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);
        rig.tick(&mut puck, SENSING);

        let sent = rig.channel.take_sent();
        assert_eq!(MessageHeader::decode(&sent[0]).unwrap(), MessageHeader::visual(4));
        Ok(())
    }

    #[test]
    fn test_motion_and_indicator_follow_proximity() -> Result<(), ConfigError> {
        let mut rig = Rig::default();
        let mut puck = Puck::<4>::new(small_config())?;
        rig.tick(&mut puck, MOTION);
        assert_eq!(puck.motion_state(), MotionState::Forwards);
        assert_eq!(rig.indicator.lit, None);

        rig.proximity.frame = ProximityFrame([0, 0, 0, 0, 0, 0, 0, 700]);
        rig.tick(&mut puck, MOTION);
        assert_eq!(puck.motion_state(), MotionState::TurnRight);
        assert_eq!(rig.indicator.lit, Some(7));

        // Motion off does not touch sensing
        rig.tick(&mut puck, PARKED);
        assert_eq!(puck.motion_state(), MotionState::Stop);
        assert_eq!(puck.tx_state(), TxState::Init);
        assert!(rig.channel.take_sent().is_empty());
        assert_eq!(rig.drive.speeds, vec![(200, 200), (50, -50), (0, 0)]);
        Ok(())
    }

    #[test]
    fn test_disabled_modules_are_skipped() -> Result<(), ConfigError> {
        let mut config = small_config();
        config.modules.proximity = false;
        config.modules.transmission = false;
        let mut rig = Rig::default();
        rig.proximity.frame = ProximityFrame([900; 8]);
        rig.imager.frame_ready = true;
        let mut puck = Puck::<4>::new(config)?;

        let both = Mode::from_selector(Mode::MOTION | Mode::SENSING);
        for _ in 0..6 {
            rig.tick(&mut puck, both);
        }

        // The ring is never read, so motion sees a clear path
        assert_eq!(rig.indicator.lit, None);
        assert_eq!(puck.motion_state(), MotionState::Forwards);
        // Nothing drains the pool
        assert_eq!(puck.tx_state(), TxState::Init);
        assert!(rig.channel.take_sent().is_empty());
        assert!(puck.is_starved());
        Ok(())
    }
}
