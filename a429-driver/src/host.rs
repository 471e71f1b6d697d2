/// Host link for callback messages
///
/// The core hands over at most one message per tick and only after `send_possible` returned
/// true, so an implementation never has to queue.
pub trait Transport {
    /// Whether `send` would accept a message now
    fn send_possible(&mut self) -> bool;

    fn send(&mut self, message: &[u8]);
}
