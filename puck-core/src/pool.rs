//! The two image buffers shared by capture and transmission
//!
//! Ownership of a slot is carried by its `ready` flag alone. Capture may only write a
//! slot whose flag is clear and sets it when the image is complete; transmission may
//! only read a slot whose flag is set and clears it once the last byte has left the
//! serial port. Both sides scan slot 0 before slot 1.

use heapless::Vec;

use crate::config::ConfigError;

pub const SLOTS: usize = 2;

struct ImageBuffer<const N: usize> {
    data: Vec<u8, N>,
    /// Holds an image that has not been fully transmitted yet
    ready: bool,
}

impl<const N: usize> ImageBuffer<N> {
    fn new(len: usize) -> Result<Self, ConfigError> {
        let mut data = Vec::new();
        data.resize(len, 0).map_err(|_| ConfigError::ImageTooLarge { size: len, capacity: N })?;
        Ok(Self { data, ready: false })
    }
}

pub struct BufferPool<const N: usize> {
    slots: [ImageBuffer<N>; SLOTS],
}

impl<const N: usize> BufferPool<N> {
    /// Allocate both slots at `image_len` bytes, neither ready
    pub fn new(image_len: usize) -> Result<Self, ConfigError> {
        if image_len == 0 {
            return Err(ConfigError::EmptyImage);
        }
        Ok(Self {
            slots: [ImageBuffer::new(image_len)?, ImageBuffer::new(image_len)?],
        })
    }

    pub fn image_len(&self) -> usize {
        self.slots[0].data.len()
    }

    pub fn is_ready(&self, index: usize) -> bool {
        self.slots[index].ready
    }

    /// First slot capture may fill
    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(|slot| !slot.ready)
    }

    /// First slot transmission may drain
    pub fn first_ready(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.ready)
    }

    /// Hand a freshly captured slot to transmission
    pub fn mark_ready(&mut self, index: usize) {
        debug_assert!(!self.slots[index].ready, "capture overwrote a ready slot");
        self.slots[index].ready = true;
    }

    /// Hand a transmitted slot back to capture
    pub fn release(&mut self, index: usize) {
        debug_assert!(self.slots[index].ready, "released a slot that was not ready");
        self.slots[index].ready = false;
    }

    pub fn data(&self, index: usize) -> &[u8] {
        debug_assert!(self.slots[index].ready, "read a slot that holds no image");
        &self.slots[index].data
    }

    pub(crate) fn data_mut(&mut self, index: usize) -> &mut [u8] {
        debug_assert!(!self.slots[index].ready, "wrote into a ready slot");
        &mut self.slots[index].data
    }
}
