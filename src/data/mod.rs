//! Sample buffering and storage.
pub mod layout;
pub mod read;
pub mod ring_buffer;
pub mod storage;
pub mod writer;

pub use layout::StorageLayout;
pub use ring_buffer::{ChannelBank, RingBuffer};
pub use storage::{BlockStorage, FsStorage, OpenMode};
pub use writer::{CaptureWriter, FlushReport};

/// One raw ADC conversion (12-bit resolution fits comfortably).
pub type Sample = u16;
