//! Byte-counting stream adapters and tracked copy

pub mod copy;
pub mod counting;

// Re-export main types
pub use copy::copy_tracked;
pub use counting::{CountingReader, CountingWriter};
