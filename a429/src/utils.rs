pub mod bitmap;
pub mod ring_buffer;
pub mod sequence;

pub use bitmap::Bitmap;
pub use ring_buffer::RingBuffer;
pub use sequence::SequenceNumber;
