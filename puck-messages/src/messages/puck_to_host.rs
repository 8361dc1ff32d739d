//! Headers and payloads sent from the puck to the host

use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;
use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::Error;

/// Size of an encoded [`MessageHeader`]
pub const HEADER_LEN: usize = 8;

/// Size of an encoded [`ConfigPayload`]
pub const CONFIG_PAYLOAD_LEN: usize = 8;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum MessageType {
    /// Image geometry, sent once per sensing session
    Config = 0x01,
    /// One raw grey-scale image
    Visual = 0x02,
}

impl TryFrom<u32> for MessageType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Config),
            0x02 => Ok(Self::Visual),
            other => Err(Error::UnknownMessageType(other)),
        }
    }
}

// Wire layouts. These are the protocol, changing them breaks the host.

#[derive(AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
struct RawHeader {
    msg_type: U32<LittleEndian>,
    len: U32<LittleEndian>,
}

#[derive(AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
struct RawConfig {
    cols: U32<LittleEndian>,
    rows: U32<LittleEndian>,
}

assert_eq_size!(RawHeader, [u8; HEADER_LEN]);
assert_eq_size!(RawConfig, [u8; CONFIG_PAYLOAD_LEN]);

/// Precedes every payload
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MessageHeader {
    pub msg_type: MessageType,
    /// Length of the payload that follows, in bytes
    pub len: u32,
}

impl MessageHeader {
    pub fn config() -> Self {
        Self {
            msg_type: MessageType::Config,
            len: CONFIG_PAYLOAD_LEN as u32,
        }
    }

    pub fn visual(len: u32) -> Self {
        Self {
            msg_type: MessageType::Visual,
            len,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let raw = RawHeader {
            msg_type: U32::new(self.msg_type as u32),
            len: U32::new(self.len),
        };
        let mut out = [0; HEADER_LEN];
        out.copy_from_slice(raw.as_bytes());
        out
    }

    /// Decode a header from the front of `bytes`. Trailing bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let raw = RawHeader::read_from_prefix(bytes).ok_or(Error::Truncated {
            expected: HEADER_LEN,
            actual: bytes.len(),
        })?;

        Ok(Self {
            msg_type: MessageType::try_from(raw.msg_type.get())?,
            len: raw.len.get(),
        })
    }
}

/// Image geometry, so the host can size its frame buffers
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigPayload {
    pub cols: u32,
    pub rows: u32,
}

impl ConfigPayload {
    /// Size of one image described by this configuration
    pub fn image_len(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn encode(&self) -> [u8; CONFIG_PAYLOAD_LEN] {
        let raw = RawConfig {
            cols: U32::new(self.cols),
            rows: U32::new(self.rows),
        };
        let mut out = [0; CONFIG_PAYLOAD_LEN];
        out.copy_from_slice(raw.as_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let raw = RawConfig::read_from_prefix(bytes).ok_or(Error::Truncated {
            expected: CONFIG_PAYLOAD_LEN,
            actual: bytes.len(),
        })?;

        Ok(Self {
            cols: raw.cols.get(),
            rows: raw.rows.get(),
        })
    }
}
