#![no_std]

//! Messages used by the puck for robot <--> host communication
//!
//! The protocol is two messages deep. The robot sends a fixed-layout
//! [`MessageHeader`], waits for the host to answer with a single [`ACK`] byte, and
//! then sends the payload the header announced. The first exchange after sensing is
//! enabled carries a [`ConfigPayload`]; every exchange after that carries one raw
//! grey-scale image of `cols * rows` bytes.
//!
//! All integers are little-endian, the byte order of the robot's MCU.

use thiserror::Error;

pub mod messages;

pub use messages::host_to_puck::{ACK, Ack};
pub use messages::puck_to_host::{CONFIG_PAYLOAD_LEN, ConfigPayload, HEADER_LEN, MessageHeader, MessageType};

/// Error type
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("unknown message type {0:#x}")]
    UnknownMessageType(u32),
}
