//! Bytes sent from the host back to the puck

use serde::{Deserialize, Serialize};

/// Acknowledges a header. The puck gates every payload on receiving this byte.
pub const ACK: u8 = 0x06;

/// A single acknowledgement byte
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ack(pub u8);

impl Default for Ack {
    fn default() -> Self {
        Self(ACK)
    }
}

impl Ack {
    pub fn matches(&self, byte: u8) -> bool {
        self.0 == byte
    }
}
