//! In-memory stand-ins for the hardware seams

use std::collections::VecDeque;
use std::vec::Vec;

use crate::capture::Imager;
use crate::channel::Channel;
use crate::motion::{Drive, Indicator, Proximity, ProximityFrame};

/// Records every send and replays injected receive bytes
///
/// Sends finish immediately unless `hold_sends` is set, in which case the channel reports
/// busy until `complete_send` is called.
#[derive(Debug, Default)]
pub struct MockChannel {
    pub hold_sends: bool,
    sending: bool,
    sent: Vec<Vec<u8>>,
    rx: VecDeque<u8>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn complete_send(&mut self) {
        self.sending = false;
    }

    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        core::mem::take(&mut self.sent)
    }
}

impl Channel for MockChannel {
    fn send(&mut self, bytes: &[u8]) {
        assert!(!self.sending, "send started while another is in flight");
        self.sent.push(bytes.to_vec());
        self.sending = self.hold_sends;
    }

    fn is_sending(&self) -> bool {
        self.sending
    }

    fn has_byte(&self) -> bool {
        !self.rx.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

/// Completes a frame whenever `frame_ready` is set, filling it with 1, then 2, ..
#[derive(Debug)]
pub struct MockImager {
    pub frame_ready: bool,
    pub starts: usize,
    pub aborts: usize,
    next_fill: u8,
}

impl MockImager {
    pub fn new() -> Self {
        Self {
            frame_ready: false,
            starts: 0,
            aborts: 0,
            next_fill: 1,
        }
    }
}

impl Default for MockImager {
    fn default() -> Self {
        Self::new()
    }
}

impl Imager for MockImager {
    fn start_capture(&mut self) {
        self.starts += 1;
    }

    fn poll_capture(&mut self, target: &mut [u8]) -> bool {
        if !self.frame_ready {
            return false;
        }
        target.fill(self.next_fill);
        self.next_fill = self.next_fill.wrapping_add(1);
        true
    }

    fn abort(&mut self) {
        self.aborts += 1;
    }
}

#[derive(Debug, Default)]
pub struct MockDrive {
    pub speeds: Vec<(i16, i16)>,
}

impl Drive for MockDrive {
    fn set_speeds(&mut self, left: i16, right: i16) {
        self.speeds.push((left, right));
    }
}

#[derive(Debug, Default)]
pub struct MockIndicator {
    pub lit: Option<usize>,
}

impl Indicator for MockIndicator {
    fn show_closest(&mut self, sensor: Option<usize>) {
        self.lit = sensor;
    }
}

/// Reports the same frame until told otherwise
#[derive(Debug, Default)]
pub struct MockProximity {
    pub frame: ProximityFrame,
}

impl Proximity for MockProximity {
    fn read(&mut self) -> ProximityFrame {
        self.frame
    }
}
