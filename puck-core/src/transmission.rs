//! Image streaming: the consumer side of the buffer pool and the protocol driver
//!
//! After sensing is enabled the configuration header is sent and acknowledged, then the
//! configuration payload follows. From there on every ready slot is streamed as a
//! visual header, an acknowledgement from the host, and the raw image.
//!
//! The handshake is minimal:
//! - slot 0 always wins a scan, so slot 1 waits as long as slot 0 keeps being refilled
//! - there is no timeout on an acknowledgement; a silent host parks the FSM until
//!   sensing is switched off
//! - any received byte equal to the acknowledgement value counts as one

use puck_messages::{Ack, ConfigPayload, MessageHeader};

use crate::channel::Channel;
use crate::pool::BufferPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxState {
    Init,
    SendConfig,
    AwaitConfigAck,
    ScanVisual,
    AwaitVisualAck { target: usize },
    AwaitSendComplete { target: usize },
}

pub struct TransmissionFsm {
    state: TxState,
    /// Last byte read while waiting for an acknowledgement, `None` when empty
    ack: Option<u8>,
    sentinel: Ack,
    config: ConfigPayload,
}

impl TransmissionFsm {
    pub fn new(config: ConfigPayload, sentinel: Ack) -> Self {
        Self {
            state: TxState::Init,
            ack: None,
            sentinel,
            config,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    fn acked(&self) -> bool {
        self.ack.is_some_and(|byte| self.sentinel.matches(byte))
    }

    /// Consume at most one byte towards the acknowledgement.
    /// Returns `true` once the acknowledgement is in and the channel is idle.
    fn poll_ack<C>(&mut self, channel: &mut C) -> bool
    where
        C: Channel + ?Sized,
    {
        if channel.has_byte() && !self.acked() {
            self.ack = channel.read_byte();
            trace!("tx: read {}", self.ack);
            false
        } else {
            !channel.is_sending() && self.acked()
        }
    }

    pub fn step<const N: usize, C>(&mut self, sensing: bool, pool: &mut BufferPool<N>, channel: &mut C) -> TxState
    where
        C: Channel + ?Sized,
    {
        let next = match self.state {
            _ if !sensing => {
                self.ack = None;
                TxState::Init
            }
            TxState::Init => TxState::SendConfig,
            TxState::SendConfig => {
                if channel.is_sending() {
                    TxState::SendConfig
                } else {
                    channel.send(&MessageHeader::config().encode());
                    self.ack = None;
                    TxState::AwaitConfigAck
                }
            }
            TxState::AwaitConfigAck => {
                if self.poll_ack(channel) {
                    channel.send(&self.config.encode());
                    info!("tx: configuration sent ({}x{})", self.config.cols, self.config.rows);
                    TxState::ScanVisual
                } else {
                    TxState::AwaitConfigAck
                }
            }
            TxState::ScanVisual => match pool.first_ready() {
                Some(target) if !channel.is_sending() => {
                    channel.send(&MessageHeader::visual(pool.image_len() as u32).encode());
                    self.ack = None;
                    TxState::AwaitVisualAck { target }
                }
                _ => TxState::ScanVisual,
            },
            TxState::AwaitVisualAck { target } => {
                if self.poll_ack(channel) {
                    channel.send(pool.data(target));
                    self.ack = None;
                    TxState::AwaitSendComplete { target }
                } else {
                    TxState::AwaitVisualAck { target }
                }
            }
            TxState::AwaitSendComplete { target } => {
                if channel.is_sending() {
                    TxState::AwaitSendComplete { target }
                } else {
                    pool.release(target);
                    TxState::ScanVisual
                }
            }
        };

        if next != self.state {
            debug!("tx: {} -> {}", self.state, next);
        }
        self.state = next;
        next
    }
}
