//! Sans-io receiver for the puck's image stream
//!
//! Feed whatever arrives on the serial port to [`PuckLink::handle_receive`], drain
//! decoded frames with [`PuckLink::poll_receive`] and write every [`Transmit`] from
//! [`PuckLink::poll_transmit`] back to the port. Reading and writing the port is left
//! to the caller, see `examples/tcp_receiver.rs`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use puck_messages::{Ack, CONFIG_PAYLOAD_LEN, ConfigPayload, HEADER_LEN, MessageHeader, MessageType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error(transparent)]
    Message(#[from] puck_messages::Error),
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: u32, max: u32 },
    #[error("image announced before any configuration")]
    UnconfiguredVisual,
    #[error("configuration header announces {0} bytes")]
    ConfigLengthMismatch(u32),
    #[error("image of {actual} bytes does not match the configured {expected}")]
    ImageSizeMismatch { expected: usize, actual: usize },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct LinkConfig {
    /// Byte sent back for every header
    pub ack: Ack,
    /// Largest payload a header may announce
    pub max_payload: u32,
    /// How long a partly received payload may go without a new byte before the link
    /// gives up on it and hunts for a header again
    pub payload_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ack: Ack::default(),
            // A full, un-subsampled sensor frame
            max_payload: 640 * 480,
            payload_timeout_ms: 1000,
        }
    }
}

/// Bytes to write back to the puck
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmit {
    pub payload: Vec<u8>,
}

/// One grey-scale image, row major, one byte per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    pub cols: u32,
    pub rows: u32,
    pub data: Vec<u8>,
}

impl ImageFrame {
    pub fn pixel(&self, col: u32, row: u32) -> Option<u8> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.data.get((row * self.cols + col) as usize).copied()
    }

    /// Encode as a binary PGM (P5) image
    pub fn to_pgm(&self) -> Vec<u8> {
        let mut pgm = Vec::with_capacity(self.data.len() + 20);
        pgm.extend_from_slice(format!("P5\n{} {}\n255\n", self.cols, self.rows).as_bytes());
        pgm.extend_from_slice(&self.data);
        pgm
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Config(ConfigPayload),
    Image(ImageFrame),
}

#[derive(Debug, Clone, Copy)]
enum Expect {
    Header,
    Payload(MessageHeader),
}

pub struct PuckLink {
    config: LinkConfig,
    buffer: Vec<u8>,
    expect: Expect,
    geometry: Option<ConfigPayload>,
    /// Buffered length and the time it was first seen while waiting for a payload
    stalled: Option<(usize, Instant)>,
    buffered_transmits: VecDeque<Transmit>,
}

impl Default for PuckLink {
    fn default() -> Self {
        Self::new(LinkConfig::default())
    }
}

impl PuckLink {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            expect: Expect::Header,
            geometry: None,
            stalled: None,
            buffered_transmits: VecDeque::new(),
        }
    }

    /// Queue bytes read from the serial port
    pub fn handle_receive(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Get the next bytes to write to the serial port
    pub fn poll_transmit(&mut self) -> Option<Transmit> {
        self.buffered_transmits.pop_front()
    }

    /// Decode the next complete frame from the received bytes
    ///
    /// Every accepted header queues an acknowledgement. On error everything buffered so
    /// far is dropped and the link waits for a fresh header.
    pub fn poll_receive(&mut self) -> Result<Option<Frame>, LinkError> {
        loop {
            match self.expect {
                Expect::Header => {
                    if self.buffer.len() < HEADER_LEN {
                        return Ok(None);
                    }
                    let header = match self.accept_header() {
                        Ok(header) => header,
                        Err(err) => {
                            warn!("dropping {} buffered bytes: {}", self.buffer.len(), err);
                            self.reset();
                            return Err(err);
                        }
                    };
                    self.buffer.drain(..HEADER_LEN);
                    debug!("header {:?}, acknowledging", header);
                    self.buffered_transmits.push_back(Transmit {
                        payload: vec![self.config.ack.0],
                    });
                    self.expect = Expect::Payload(header);
                }
                Expect::Payload(header) => {
                    let len = header.len as usize;
                    if self.buffer.len() < len {
                        return Ok(None);
                    }
                    let payload: Vec<u8> = self.buffer.drain(..len).collect();
                    self.expect = Expect::Header;
                    self.stalled = None;
                    return self.finish(header, payload).map(Some);
                }
            }
        }
    }

    /// Give up on a payload that stopped arriving
    ///
    /// Call this regularly, with or without new bytes. Once the buffered length has not
    /// changed for `payload_timeout_ms` while a payload is expected, the partial payload
    /// is abandoned. A puck that was switched off after its header was acknowledged
    /// starts over with a configuration header, so the buffer is searched for a header
    /// one byte at a time before anything is dropped. Returns `true` if the payload was
    /// abandoned.
    pub fn handle_timeout(&mut self, now: Instant) -> bool {
        let Expect::Payload(header) = self.expect else {
            self.stalled = None;
            return false;
        };

        let len = self.buffer.len();
        match self.stalled {
            Some((seen, since)) if seen == len => {
                let timeout = Duration::from_millis(self.config.payload_timeout_ms);
                if now.saturating_duration_since(since) < timeout {
                    return false;
                }
            }
            _ => {
                self.stalled = Some((len, now));
                return false;
            }
        }

        warn!("abandoning {:?} after {} of {} bytes", header.msg_type, len, header.len);
        self.expect = Expect::Header;
        self.stalled = None;
        while self.buffer.len() >= HEADER_LEN && self.accept_header().is_err() {
            self.buffer.remove(0);
        }
        if self.buffer.len() < HEADER_LEN {
            self.buffer.clear();
        }
        true
    }

    /// Drop everything buffered and wait for a fresh header
    ///
    /// Pending acknowledgements and the last configuration are kept.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.expect = Expect::Header;
        self.stalled = None;
    }

    fn accept_header(&self) -> Result<MessageHeader, LinkError> {
        let header = MessageHeader::decode(&self.buffer)?;
        if header.len > self.config.max_payload {
            return Err(LinkError::PayloadTooLarge {
                len: header.len,
                max: self.config.max_payload,
            });
        }

        match header.msg_type {
            MessageType::Config if header.len as usize != CONFIG_PAYLOAD_LEN => {
                Err(LinkError::ConfigLengthMismatch(header.len))
            }
            MessageType::Config => Ok(header),
            MessageType::Visual => {
                let geometry = self.geometry.ok_or(LinkError::UnconfiguredVisual)?;
                let expected = geometry.image_len();
                if header.len as usize != expected {
                    return Err(LinkError::ImageSizeMismatch {
                        expected,
                        actual: header.len as usize,
                    });
                }
                Ok(header)
            }
        }
    }

    fn finish(&mut self, header: MessageHeader, payload: Vec<u8>) -> Result<Frame, LinkError> {
        match header.msg_type {
            MessageType::Config => {
                let geometry = ConfigPayload::decode(&payload)?;
                info!("puck configured for {}x{} images", geometry.cols, geometry.rows);
                self.geometry = Some(geometry);
                Ok(Frame::Config(geometry))
            }
            MessageType::Visual => {
                let geometry = self.geometry.ok_or(LinkError::UnconfiguredVisual)?;
                Ok(Frame::Image(ImageFrame {
                    cols: geometry.cols,
                    rows: geometry.rows,
                    data: payload,
                }))
            }
        }
    }
}
