/// Half-duplex serial transport to the host
///
/// All calls must return immediately. `send` starts a transmission and the caller polls
/// `is_sending` until it is done; implementations copy or queue the bytes they are given.
/// Starting a send while a previous one is still in flight is a caller error.
pub trait Channel {
    fn send(&mut self, bytes: &[u8]);

    fn is_sending(&self) -> bool;

    fn has_byte(&self) -> bool;

    /// Consume one received byte, `None` if nothing is pending
    fn read_byte(&mut self) -> Option<u8>;
}
